use super::types::AcceptedEntry;

/// Files staged for upload, in preview order, capped at `max_len`.
#[derive(Debug, Clone)]
pub struct AcceptedBatch {
    entries: Vec<AcceptedEntry>,
    max_len: usize,
}

/// What has to happen before a submission may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitGate {
    Empty,
    Ready,
    NeedsConfirmation { warned: usize },
}

impl AcceptedBatch {
    pub fn new(max_len: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_len,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn remaining_capacity(&self) -> usize {
        self.max_len.saturating_sub(self.entries.len())
    }

    pub fn entries(&self) -> &[AcceptedEntry] {
        &self.entries
    }

    /// Appends a gesture's admitted files. Anything past the cap is returned.
    pub fn append(&mut self, admitted: Vec<AcceptedEntry>) -> Vec<AcceptedEntry> {
        let mut admitted = admitted;
        let keep = admitted.len().min(self.remaining_capacity());
        let overflow = admitted.split_off(keep);
        self.entries.extend(admitted);
        overflow
    }

    pub fn remove(&mut self, index: usize) -> Option<AcceptedEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn warned_count(&self) -> usize {
        self.entries.iter().filter(|e| e.has_warning()).count()
    }

    pub fn submit_gate(&self) -> SubmitGate {
        if self.entries.is_empty() {
            return SubmitGate::Empty;
        }
        match self.warned_count() {
            0 => SubmitGate::Ready,
            warned => SubmitGate::NeedsConfirmation { warned },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::types::CandidateFile;
    use crate::verify::VerificationOutcome;
    use crate::verify::VerificationStatus;

    fn entry(name: &str, warned: bool) -> AcceptedEntry {
        AcceptedEntry {
            file: CandidateFile::new(name, "image/png", vec![0; 4]),
            outcome: VerificationOutcome {
                status: if warned {
                    VerificationStatus::NoCodeDetected
                } else {
                    VerificationStatus::IdentityMatched
                },
                code_detected: !warned,
                identity_matched: !warned,
                decoded_payload: None,
                requires_confirmation: warned,
                message: None,
                extracted: None,
            },
        }
    }

    #[test]
    fn append_never_exceeds_cap() {
        let mut batch = AcceptedBatch::new(3);
        let overflow = batch.append(vec![entry("a", false), entry("b", false)]);
        assert!(overflow.is_empty());

        let overflow = batch.append(vec![entry("c", false), entry("d", false)]);
        assert_eq!(batch.len(), 3);
        assert_eq!(overflow.len(), 1);
        assert_eq!(overflow[0].file.name, "d");
        assert_eq!(batch.remaining_capacity(), 0);
    }

    #[test]
    fn remove_keeps_order() {
        let mut batch = AcceptedBatch::new(10);
        batch.append(vec![entry("a", false), entry("b", false), entry("c", false)]);
        assert_eq!(batch.remove(1).map(|e| e.file.name), Some("b".to_string()));
        assert!(batch.remove(5).is_none());
        let names: Vec<_> = batch.entries().iter().map(|e| e.file.name.as_str()).collect();
        assert_eq!(names, ["a", "c"]);
    }

    #[test]
    fn gate_counts_warned_files() {
        let mut batch = AcceptedBatch::new(10);
        assert_eq!(batch.submit_gate(), SubmitGate::Empty);

        batch.append(vec![entry("a", false)]);
        assert_eq!(batch.submit_gate(), SubmitGate::Ready);

        batch.append(vec![entry("b", true), entry("c", true)]);
        assert_eq!(batch.submit_gate(), SubmitGate::NeedsConfirmation { warned: 2 });

        batch.clear();
        assert!(batch.is_empty());
    }
}
