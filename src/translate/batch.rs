use crate::config::validate_batch_count;
use crate::error::Result;

/// A contiguous run of numbered units sent in one completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Position of the first unit in the full unit list
    pub offset: usize,
    /// Number of units in this batch
    pub len: usize,
    /// Numbered units joined by line breaks
    pub content: String,
}

impl Batch {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Group numbered units into chunks of at most `batch_count`, preserving order.
pub fn batch_units(numbered: &[String], batch_count: usize) -> Result<Vec<Batch>> {
    validate_batch_count(batch_count)?;

    Ok(numbered
        .chunks(batch_count)
        .enumerate()
        .map(|(i, chunk)| Batch {
            offset: i * batch_count,
            len: chunk.len(),
            content: chunk.join("\n"),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SubtransError;

    fn numbered(count: usize) -> Vec<String> {
        (1..=count).map(|i| format!("{}.line {}", i, i)).collect()
    }

    #[test]
    fn test_batches_cover_all_units_in_order() {
        let units = numbered(7);
        let batches = batch_units(&units, 3).unwrap();

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].content, "1.line 1\n2.line 2\n3.line 3");
        assert_eq!(batches[2].range(), 6..7);

        let rejoined: Vec<String> = batches
            .iter()
            .flat_map(|b| b.content.split('\n').map(str::to_string).collect::<Vec<_>>())
            .collect();
        assert_eq!(rejoined, units);

        let mut expected_offset = 0;
        for batch in &batches {
            assert_eq!(batch.offset, expected_offset);
            expected_offset += batch.len;
        }
        assert_eq!(expected_offset, units.len());
    }

    #[test]
    fn test_single_batch_when_count_exceeds_units() {
        let batches = batch_units(&numbered(2), 100).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len, 2);
    }

    #[test]
    fn test_no_units_yields_no_batches() {
        assert!(batch_units(&[], 10).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_batch_count_is_rejected() {
        assert!(matches!(batch_units(&numbered(3), 0), Err(SubtransError::Validation(_))));
        assert!(matches!(batch_units(&numbered(3), 101), Err(SubtransError::Validation(_))));
    }
}
