// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Interactive prompts on the controlling terminal

use crate::error::{InstallerError, Result};
use crate::strategy::StrategyKind;
use std::io::{BufRead, Write};

/// Map a menu answer to a deployment method
pub fn parse_strategy_choice(answer: &str) -> Result<StrategyKind> {
    match answer.trim() {
        "1" => Ok(StrategyKind::Operator),
        "2" => Ok(StrategyKind::Compose),
        other => Err(InstallerError::InvalidInput(format!(
            "'{}' is not a valid choice, expected 1 or 2",
            other
        ))),
    }
}

/// Only an explicit yes counts as confirmation
pub fn parse_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn read_answer<R: BufRead>(input: &mut R) -> Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(InstallerError::InvalidInput(
            "no answer, standard input is closed".to_string(),
        ));
    }
    Ok(line)
}

/// Show the deployment menu and read a single choice
pub fn ask_strategy<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<StrategyKind> {
    writeln!(output, "Select an installation method:")?;
    writeln!(output, "  1) AWX operator on Kubernetes")?;
    writeln!(output, "  2) Docker Compose")?;
    write!(output, "Choice [1-2]: ")?;
    output.flush()?;

    parse_strategy_choice(&read_answer(input)?)
}

/// Ask a yes/no question, defaulting to no
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<bool> {
    write!(output, "{} [y/N]: ", question)?;
    output.flush()?;

    Ok(parse_confirmation(&read_answer(input)?))
}
