//! Terminal presentation of rendered plan blocks.
//!
//! Consecutive ordered items are numbered from 1; any other block resets
//! the counter. Styling is only applied when writing to a terminal.

use std::io::{self, IsTerminal, Write};

use crossterm::style::{Stylize, style};

use studyplan_core::render::{RenderedBlock, Span};

pub const PLAN_TITLE: &str = "Ваш учебный план";

/// Print `blocks` to stdout, styled when stdout is a terminal.
pub fn print_blocks(blocks: &[RenderedBlock]) -> io::Result<()> {
    let stdout = io::stdout();
    let styled = stdout.is_terminal();
    let mut out = stdout.lock();
    write_blocks(&mut out, blocks, styled)?;
    out.flush()
}

pub fn write_blocks(out: &mut impl Write, blocks: &[RenderedBlock], styled: bool) -> io::Result<()> {
    let mut ordinal = 0usize;
    for block in blocks {
        match block {
            RenderedBlock::ListItem { ordered: true, .. } => ordinal += 1,
            _ => ordinal = 0,
        }
        write_block(out, block, ordinal, styled)?;
    }
    Ok(())
}

fn write_block(
    out: &mut impl Write,
    block: &RenderedBlock,
    ordinal: usize,
    styled: bool,
) -> io::Result<()> {
    match block {
        RenderedBlock::Heading { level, text } => {
            if !styled {
                let marks = "#".repeat(usize::from(*level));
                return writeln!(out, "{marks} {text}");
            }
            match level {
                1 => writeln!(out, "{}", style(text).bold().underlined().magenta()),
                2 => writeln!(out, "{}", style(text).bold().cyan()),
                _ => writeln!(out, "{}", style(text).bold()),
            }
        }
        RenderedBlock::Paragraph { spans } => {
            for span in spans {
                match span {
                    Span::Bold(text) if styled => write!(out, "{}", style(text).bold())?,
                    other => write!(out, "{}", other.text())?,
                }
            }
            writeln!(out)
        }
        RenderedBlock::ListItem { ordered: false, text } => writeln!(out, "  • {text}"),
        RenderedBlock::ListItem { ordered: true, text } => writeln!(out, "  {ordinal}. {text}"),
        RenderedBlock::Spacer => writeln!(out),
    }
}
