use std::error::Error;

use buildrun::errors::Result as BuildrunResult;
use buildrun::exec::{LineBuffer, LineSink};

type TestResult = Result<(), Box<dyn Error>>;

/// Sink that records every emitted line, in order.
#[derive(Default)]
struct RecordingSink {
    lines: Vec<Vec<u8>>,
}

impl LineSink for RecordingSink {
    async fn write_line(&mut self, line: &[u8]) -> BuildrunResult<()> {
        self.lines.push(line.to_vec());
        Ok(())
    }
}

fn lines(buf: &LineBuffer<RecordingSink>) -> Vec<String> {
    buf.sink()
        .lines
        .iter()
        .map(|l| String::from_utf8_lossy(l).into_owned())
        .collect()
}

#[tokio::test]
async fn complete_lines_emitted_immediately_fragment_only_at_flush() -> TestResult {
    let mut buf = LineBuffer::new(RecordingSink::default());

    buf.feed(b"a\nb\nc").await?;
    assert_eq!(lines(&buf), ["a", "b"]);

    buf.flush().await?;
    assert_eq!(lines(&buf), ["a", "b", "c"]);
    Ok(())
}

#[tokio::test]
async fn empty_chunk_is_a_noop() -> TestResult {
    let mut buf = LineBuffer::new(RecordingSink::default());

    buf.feed(b"").await?;
    buf.flush().await?;
    assert!(lines(&buf).is_empty());
    Ok(())
}

#[tokio::test]
async fn lone_newline_emits_one_empty_line() -> TestResult {
    let mut buf = LineBuffer::new(RecordingSink::default());

    buf.feed(b"\n").await?;
    buf.flush().await?;
    assert_eq!(lines(&buf), [""]);
    Ok(())
}

#[tokio::test]
async fn fragments_join_across_chunks() -> TestResult {
    let mut buf = LineBuffer::new(RecordingSink::default());

    buf.feed(b"x").await?;
    assert!(lines(&buf).is_empty());

    buf.feed(b"y\n").await?;
    buf.flush().await?;
    assert_eq!(lines(&buf), ["xy"]);
    Ok(())
}

#[tokio::test]
async fn line_split_across_three_chunks() -> TestResult {
    let mut buf = LineBuffer::new(RecordingSink::default());

    buf.feed(b"he").await?;
    buf.feed(b"ll").await?;
    buf.feed(b"o\nwor").await?;
    assert_eq!(lines(&buf), ["hello"]);

    buf.feed(b"ld").await?;
    buf.flush().await?;
    assert_eq!(lines(&buf), ["hello", "world"]);
    Ok(())
}

#[tokio::test]
async fn many_lines_in_a_single_chunk() -> TestResult {
    let mut buf = LineBuffer::new(RecordingSink::default());

    let mut chunk = Vec::new();
    let expected: Vec<String> = (0..1000).map(|i| format!("line-{i}")).collect();
    for line in &expected {
        chunk.extend_from_slice(line.as_bytes());
        chunk.push(b'\n');
    }

    buf.feed(&chunk).await?;
    assert_eq!(lines(&buf), expected);

    // Everything ended in a newline, so flush has nothing left to emit.
    buf.flush().await?;
    assert_eq!(lines(&buf), expected);
    Ok(())
}

#[tokio::test]
async fn consecutive_newlines_preserve_empty_lines() -> TestResult {
    let mut buf = LineBuffer::new(RecordingSink::default());

    buf.feed(b"a\n\n\nb\n").await?;
    buf.flush().await?;
    assert_eq!(lines(&buf), ["a", "", "", "b"]);
    Ok(())
}

#[tokio::test]
async fn flush_after_flush_emits_nothing() -> TestResult {
    let mut buf = LineBuffer::new(RecordingSink::default());

    buf.feed(b"tail").await?;
    buf.flush().await?;
    buf.flush().await?;
    assert_eq!(lines(&buf), ["tail"]);
    Ok(())
}

#[tokio::test]
async fn concatenation_equals_split_of_input() -> TestResult {
    // Same input, three different chunkings, identical output.
    let input = b"alpha\nbeta\n\ngamma";
    let splits: &[&[usize]] = &[&[], &[1], &[5, 6, 11], &[2, 3, 4, 5, 6, 7]];

    for cuts in splits {
        let mut buf = LineBuffer::new(RecordingSink::default());
        let mut start = 0;
        for &cut in cuts.iter() {
            buf.feed(&input[start..cut]).await?;
            start = cut;
        }
        buf.feed(&input[start..]).await?;
        buf.flush().await?;
        assert_eq!(lines(&buf), ["alpha", "beta", "", "gamma"], "cuts {cuts:?}");
    }
    Ok(())
}
