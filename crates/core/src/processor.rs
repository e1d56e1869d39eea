// Text processors
//
// The CPU runner compares two implementations of the same two routines. Both
// sit behind TextProcessor so the runner never branches on which one it has.

use crate::error::{BenchError, Result};

/// Largest n whose Fibonacci number fits in a u64
pub const MAX_FIBONACCI_INPUT: u32 = 93;

/// CPU-bound text routines under comparison
pub trait TextProcessor: Send + Sync {
    /// Label used in reports
    fn name(&self) -> &str;

    /// Fibonacci number `n` (F(0) = 0, F(1) = 1)
    fn fibonacci(&self, n: u32) -> Result<u64>;

    /// Short name of the algorithm behind `fibonacci`, e.g. "recursive"
    fn fibonacci_algorithm(&self) -> &str;

    /// Number of whitespace-delimited tokens in `text`
    fn token_count(&self, text: &str) -> Result<usize>;
}

fn check_fibonacci_input(n: u32) -> Result<()> {
    if n > MAX_FIBONACCI_INPUT {
        return Err(BenchError::contract(format!("fibonacci({n}) overflows u64")));
    }
    Ok(())
}

/// Straightforward implementations: naive recursion and `split_whitespace`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceProcessor;

impl ReferenceProcessor {
    fn fib(n: u32) -> u64 {
        match n {
            0 => 0,
            1 => 1,
            _ => Self::fib(n - 1) + Self::fib(n - 2),
        }
    }
}

impl TextProcessor for ReferenceProcessor {
    fn name(&self) -> &str {
        "reference"
    }

    fn fibonacci(&self, n: u32) -> Result<u64> {
        check_fibonacci_input(n)?;
        Ok(Self::fib(n))
    }

    fn fibonacci_algorithm(&self) -> &str {
        "recursive"
    }

    fn token_count(&self, text: &str) -> Result<usize> {
        Ok(text.split_whitespace().count())
    }
}

/// Optimized implementations: iterative Fibonacci and a byte scanner that
/// counts whitespace-to-token transitions.
///
/// Token boundaries are the same as `str::split_whitespace` (Unicode
/// `White_Space`); non-ASCII input takes the char path.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeProcessor;

impl NativeProcessor {
    // ASCII members of White_Space; u8::is_ascii_whitespace omits vertical tab
    #[inline]
    fn is_ascii_space(b: u8) -> bool {
        matches!(b, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r')
    }

    fn count_ascii(bytes: &[u8]) -> usize {
        let mut count = 0;
        let mut in_token = false;
        for &b in bytes {
            let space = Self::is_ascii_space(b);
            if !space && !in_token {
                count += 1;
            }
            in_token = !space;
        }
        count
    }

    fn count_chars(text: &str) -> usize {
        let mut count = 0;
        let mut in_token = false;
        for c in text.chars() {
            let space = c.is_whitespace();
            if !space && !in_token {
                count += 1;
            }
            in_token = !space;
        }
        count
    }
}

impl TextProcessor for NativeProcessor {
    fn name(&self) -> &str {
        "native"
    }

    fn fibonacci(&self, n: u32) -> Result<u64> {
        check_fibonacci_input(n)?;
        if n == 0 {
            return Ok(0);
        }
        let (mut a, mut b) = (0u64, 1u64);
        for _ in 1..n {
            let next = a
                .checked_add(b)
                .ok_or_else(|| BenchError::contract(format!("fibonacci({n}) overflows u64")))?;
            a = b;
            b = next;
        }
        Ok(b)
    }

    fn fibonacci_algorithm(&self) -> &str {
        "iterative"
    }

    fn token_count(&self, text: &str) -> Result<usize> {
        if text.is_ascii() {
            Ok(Self::count_ascii(text.as_bytes()))
        } else {
            Ok(Self::count_chars(text))
        }
    }
}

/// `word` followed by a single space, repeated `count` times.
///
/// Has exactly `count` whitespace tokens when `word` contains no whitespace.
/// Fails when the corpus length does not fit in an allocation.
pub fn synthetic_text(word: &str, count: usize) -> Result<String> {
    let unit_len = word.len() + 1;
    unit_len
        .checked_mul(count)
        .filter(|&len| len <= isize::MAX as usize)
        .ok_or_else(|| {
            BenchError::config(format!(
                "token corpus of {count} x {unit_len} bytes is too large"
            ))
        })?;

    let mut unit = String::with_capacity(unit_len);
    unit.push_str(word);
    unit.push(' ');
    Ok(unit.repeat(count))
}
