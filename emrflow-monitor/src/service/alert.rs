//! Failure alert composition
//!
//! Step logs are shipped gzip-compressed by the cluster. The stderr log is
//! decompressed in memory and embedded in the alert body; when the body would
//! exceed the notification service's message limit only the tail of the log
//! is kept, since the error that ended the step is at the end.

use emrflow_core::domain::step::StepLogLocation;
use flate2::read::MultiGzDecoder;
use std::io::Read;

/// Largest message body the notification service accepts (256 KiB)
pub const MAX_MESSAGE_BYTES: usize = 256 * 1024;

/// Room left for the truncation marker line
const TRUNCATION_RESERVE: usize = 64;

/// Decompresses a gzip stream into UTF-8 text
pub fn decompress_log(data: &[u8]) -> std::io::Result<String> {
    let mut text = String::new();
    MultiGzDecoder::new(data).read_to_string(&mut text)?;
    Ok(text)
}

/// An alert ready to publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureAlert {
    pub subject: String,
    pub message: String,
}

impl FailureAlert {
    /// Builds the alert for a failed step
    ///
    /// # Arguments
    /// * `subject` - Subject line of the notification
    /// * `location` - Where the step's stderr log lives
    /// * `log` - Decompressed stderr text
    pub fn compose(subject: &str, location: &StepLogLocation, log: &str) -> Self {
        Self::compose_within(subject, location, log, MAX_MESSAGE_BYTES)
    }

    fn compose_within(subject: &str, location: &StepLogLocation, log: &str, limit: usize) -> Self {
        let header = format!(
            "There was an issue with the Hadoop cluster. \
             You can view the logs by logging into the console and navigating to {} \
             \nHere is the current STDERR : \n ",
            location.uri()
        );

        let budget = limit.saturating_sub(header.len());
        let message = if log.len() <= budget {
            format!("{}{}", header, log)
        } else {
            let (kept, omitted) = tail(log, budget.saturating_sub(TRUNCATION_RESERVE));
            format!(
                "{}[... {} earlier bytes omitted ...]\n{}",
                header, omitted, kept
            )
        };

        Self {
            subject: subject.to_string(),
            message,
        }
    }
}

/// Returns the last `max_bytes` of `text` (on a char boundary) and the number
/// of bytes dropped
fn tail(text: &str, max_bytes: usize) -> (&str, usize) {
    if text.len() <= max_bytes {
        return (text, 0);
    }

    let mut start = text.len() - max_bytes;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    (&text[start..], start)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    pub(crate) fn gzip(text: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    fn location() -> StepLogLocation {
        StepLogLocation::stderr(
            "aws-logs",
            "elasticmapreduce",
            "j-2YDUJ6ISXEY8G",
            "s-2QSHDLM0M6ABK",
        )
    }

    #[test]
    fn test_decompress_log() {
        let text =
            "Exception in thread \"main\" org.apache.spark.SparkException: Application failed\n";
        assert_eq!(decompress_log(&gzip(text)).unwrap(), text);
    }

    #[test]
    fn test_decompress_rejects_plain_text() {
        assert!(decompress_log(b"not compressed at all").is_err());
    }

    #[test]
    fn test_decompress_rejects_invalid_utf8() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&[0xff, 0xfe, 0xfd]).unwrap();
        let data = encoder.finish().unwrap();

        assert!(decompress_log(&data).is_err());
    }

    #[test]
    fn test_compose_embeds_location_and_log() {
        let alert = FailureAlert::compose("ETL Failure", &location(), "java.lang.OutOfMemoryError");

        assert_eq!(alert.subject, "ETL Failure");
        assert!(alert.message.starts_with("There was an issue with the Hadoop cluster."));
        assert!(alert.message.contains(
            "s3://aws-logs/elasticmapreduce/j-2YDUJ6ISXEY8G/steps/s-2QSHDLM0M6ABK/stderr.gz"
        ));
        assert!(alert.message.contains("Here is the current STDERR"));
        assert!(alert.message.ends_with("java.lang.OutOfMemoryError"));
    }

    #[test]
    fn test_compose_keeps_tail_of_long_logs() {
        let log = format!("{}FINAL ERROR LINE", "x".repeat(2_000));
        let alert = FailureAlert::compose_within("ETL Failure", &location(), &log, 1_024);

        assert!(alert.message.len() <= 1_024);
        assert!(alert.message.ends_with("FINAL ERROR LINE"));
        assert!(alert.message.contains("earlier bytes omitted"));
        assert!(alert.message.contains("j-2YDUJ6ISXEY8G"));
    }

    #[test]
    fn test_tail_respects_char_boundaries() {
        let text = "ééééé";
        let (kept, omitted) = tail(text, 3);
        assert_eq!(kept, "é");
        assert_eq!(omitted, 8);
    }
}
