use std::str;

use anyhow::{Context, Result};
use common::serde::Deserializer;

const CHUNK_SIZE: usize = 8 * 1024;

/// Splits the input on any of the (ASCII) delimiter bytes and calls
/// `callback` with every non-empty token. Tokens are only decoded once they
/// are complete, so multi-byte characters may straddle chunk boundaries.
pub fn tokenize<T: Deserializer>(
    des: &mut T,
    delimiter: &[u8],
    mut callback: impl FnMut(&str) -> Result<()>,
) -> Result<()> {
    let mut carry = Vec::new();
    loop {
        let next = des.read_bytes(CHUNK_SIZE)?;
        let eof = next.is_empty();
        carry.extend_from_slice(&next);

        let end = if eof {
            carry.len()
        } else {
            match carry.iter().rposition(|x| delimiter.contains(x)) {
                Some(idx) => idx + 1,
                None => continue,
            }
        };

        let tokens = carry[..end].split(|x| delimiter.contains(x));
        for token in tokens.filter(|x| !x.is_empty()) {
            callback(str::from_utf8(token).context("Input is not valid UTF-8")?)?;
        }
        carry.drain(..end);

        if eof {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use common::serde::SliceDeserializer;

    use super::tokenize;

    #[test]
    fn tokens_across_chunks() {
        let line = "v 1.25 2.5 -3.75\n";
        let input = line.repeat(2_000) + "o last";

        let mut tokens = Vec::new();
        let mut des = SliceDeserializer::new(input.as_bytes());
        tokenize(&mut des, b"\r\n", |x| {
            tokens.push(x.to_owned());
            Ok(())
        })
        .unwrap();

        assert_eq!(tokens.len(), 2_001);
        assert!(tokens[..2_000].iter().all(|x| x == line.trim_end()));
        assert_eq!(tokens[2_000], "o last");
    }

    #[test]
    fn callback_errors_stop_tokenizing() {
        let mut seen = 0;
        let mut des = SliceDeserializer::new(b"a\nb\nc\n");
        let result = tokenize(&mut des, b"\n", |x| {
            seen += 1;
            anyhow::ensure!(x != "b", "bad token");
            Ok(())
        });

        assert!(result.is_err());
        assert_eq!(seen, 2);
    }
}
