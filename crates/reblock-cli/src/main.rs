//! Reblock a text cell stream (`row col value` per line, 1-based) and print
//! the block-keyed output, one line per sink write.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use matrix_block::{BlockCoord, Format, OutputParameters};
use matrix_reblock::{AdaptivePartialBlock, OutputSink, ReblockBuffer, TaggedPartialBlock, DEFAULT_BUFFER_SIZE};

#[derive(Debug, Parser)]
#[command(name = "reblock", about = "Group matrix cells by destination block")]
struct Args {
    /// Input file; reads stdin when omitted.
    input: Option<PathBuf>,

    /// Number of matrix rows.
    #[arg(long)]
    rows: i64,

    /// Number of matrix columns.
    #[arg(long)]
    cols: i64,

    /// Rows per block.
    #[arg(long, default_value_t = 1000)]
    block_rows: i64,

    /// Columns per block.
    #[arg(long, default_value_t = 1000)]
    block_cols: i64,

    /// Buffered cells per flush.
    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE)]
    capacity: usize,

    /// Stream tag attached to every output value.
    #[arg(long, default_value_t = 0)]
    tag: u8,
}

/// Writes one summary line per payload.
struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> OutputSink for TextSink<W> {
    fn collect(&mut self, ix: BlockCoord, value: TaggedPartialBlock) -> io::Result<()> {
        match value.value() {
            AdaptivePartialBlock::Block(block) => {
                let [rows, cols] = block.shape();
                let storage = if block.is_in_sparse_format() { "sparse" } else { "dense" };
                writeln!(
                    self.out,
                    "{} {} tag={} block {}x{} {} nnz={}",
                    ix.row(),
                    ix.col(),
                    value.tag(),
                    rows,
                    cols,
                    storage,
                    block.nnz()
                )
            }
            AdaptivePartialBlock::Cell(cell) => writeln!(
                self.out,
                "{} {} tag={} cell {} {} {}",
                ix.row(),
                ix.col(),
                value.tag(),
                cell.row,
                cell.col,
                cell.value
            ),
        }
    }
}

fn parse_cell(line: &str) -> Result<(i64, i64, f64)> {
    let mut parts = line.split_whitespace();
    let (Some(r), Some(c), Some(v), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        bail!("expected `row col value`, got {:?}", line);
    };
    Ok((r.parse()?, c.parse()?, v.parse()?))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let params = OutputParameters::new(args.rows, args.cols, args.block_rows, args.block_cols, -1)?
        .with_format(Format::Text);
    let mut buffer = ReblockBuffer::from_output_parameters(&params, args.capacity)?;
    info!("reblocking {}", params);

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let stdout = io::stdout();
    let mut sink = TextSink {
        out: BufWriter::new(stdout.lock()),
    };

    let mut cells = 0usize;
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('%') || trimmed.starts_with('#') {
            continue;
        }
        let (r, c, v) = parse_cell(trimmed).with_context(|| format!("line {}", lineno + 1))?;
        buffer.append_cell_or_flush(r, c, v, args.tag, &mut sink)?;
        cells += 1;
    }
    buffer.flush(args.tag, &mut sink)?;
    sink.out.flush()?;

    info!("{} cells in {} flushes", cells, buffer.num_flushes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell("3 4 1.5").unwrap(), (3, 4, 1.5));
        assert!(parse_cell("3 4").is_err());
        assert!(parse_cell("3 4 1.5 9").is_err());
        assert!(parse_cell("a 4 1.5").is_err());
    }

    #[test]
    fn test_text_sink_output() {
        let mut buffer = ReblockBuffer::new(4, 4, 4, 2, 2).unwrap();
        buffer.append_cell(1, 1, 5.0).unwrap();
        buffer.append_cell(2, 2, 2.0).unwrap();

        let mut sink = TextSink { out: Vec::new() };
        buffer.flush(3, &mut sink).unwrap();
        let text = String::from_utf8(sink.out).unwrap();
        assert_eq!(text, "1 1 tag=3 block 2x2 dense nnz=2\n");
    }
}
