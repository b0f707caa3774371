/// A single query sequence read from a multi-FASTA file.
///
/// The label is the full header text without the leading `>`. Records are
/// immutable once read and are consumed in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub label: String,
    pub sequence: String,
}

impl SequenceRecord {
    pub fn new(label: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            sequence: sequence.into(),
        }
    }
}
