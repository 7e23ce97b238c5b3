//! `parser`: the syntax tree of the input file must equal `<test name>.txt`.

use crate::constants::{ALLOW_ERRORS_FILE, PARSER_INPUT_STEM};
use crate::dispatch::ExecutorContext;
use crate::error::{CaseError, ConfigError};
use crate::host::require;
use crate::markup::MarkupFile;
use std::fs;
use std::path::{Path, PathBuf};

pub fn execute(ctx: &mut ExecutorContext<'_>) -> Result<(), CaseError> {
    if ctx.has_fixture_file(ALLOW_ERRORS_FILE) {
        return Err(ConfigError::invalid(
            "Migrate outdated allow_errors.txt to newer <parse-error> format",
        )
        .into());
    }

    let input = find_input(ctx.test_data_path, ctx.test_name)?;
    let input_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    let text = fs::read_to_string(&input).map_err(|e| ConfigError::io(&input, e))?;

    let relative = PathBuf::from(&input_name);
    let file = MarkupFile::backed(&relative, text);
    ctx.store
        .write(&relative, file.clean_text())
        .map_err(|e| ConfigError::io(&relative, e))?;
    ctx.fixture.open_file(&relative).map_err(CaseError::host)?;

    let errors = require(ctx.fixture.parser(), "parser")?
        .parse_errors(&relative)
        .map_err(CaseError::host)?;
    file.check_parse_errors(&errors, &mut ctx.assertions)?;

    let expected_name = format!("{}.txt", ctx.test_name);
    let mut expected = ctx.read_fixture(&expected_name)?;
    // Dumps copied from an in-memory viewer name a dummy file.
    let dummy = format!("File(Dummy.{})", extension);
    if expected.contains(&dummy) {
        expected = expected.replace(&dummy, &format!("File({})", input_name));
        ctx.write_fixture(&expected_name, &expected)?;
    }

    let actual = require(ctx.fixture.parser(), "parser")?
        .syntax_tree(&relative)
        .map_err(CaseError::host)?;
    if ctx.config.override_output.parser {
        ctx.write_fixture(&expected_name, actual.trim())?;
    }
    ctx.assertions
        .assert_text_eq(expected.trim(), actual.trim(), "Unexpected syntax tree")
}

/// The single file named after the test or `input`, other than the expected output.
fn find_input(dir: &Path, test_name: &str) -> Result<PathBuf, ConfigError> {
    let mut candidates = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| ConfigError::io(dir, e))? {
        let path = entry.map_err(|e| ConfigError::io(dir, e))?.path();
        if !path.is_file() {
            continue;
        }
        let stem = path.file_stem().and_then(|s| s.to_str());
        let is_txt = path.extension().is_some_and(|e| e == "txt");
        if !is_txt && (stem == Some(test_name) || stem == Some(PARSER_INPUT_STEM)) {
            candidates.push(path);
        }
    }
    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        _ => Err(ConfigError::invalid("No or multiple input files found")),
    }
}
