use std::fmt;

/// One MX answer. Ordering is by preference, then exchange name.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MxRecord {
    pub preference: u16,
    pub exchange: String,
}

impl MxRecord {
    pub fn new(preference: u16, exchange: impl Into<String>) -> Self {
        Self {
            preference,
            exchange: exchange.into(),
        }
    }
}

impl fmt::Display for MxRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.preference, self.exchange)
    }
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MxStatus {
    Records(Vec<MxRecord>),
    NoRecords,
}

impl MxStatus {
    /// Drops null MX entries (RFC 7505, exchange "."), then sorts and
    /// dedups what is left.
    pub(crate) fn from_records(mut records: Vec<MxRecord>) -> Self {
        records.retain(|record| !record.exchange.is_empty());
        records.sort();
        records.dedup();
        if records.is_empty() {
            Self::NoRecords
        } else {
            Self::Records(records)
        }
    }

    pub fn records(&self) -> &[MxRecord] {
        match self {
            Self::Records(records) => records.as_slice(),
            Self::NoRecords => &[],
        }
    }

    /// Most preferred exchange; ties go to the alphabetically first name.
    pub fn primary(&self) -> Option<&MxRecord> {
        self.records().first()
    }
}
