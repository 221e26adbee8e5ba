use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Mmap,
    Stream,
}

/// Location and kind of one fragment packed inside a blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FragmentInfo {
    pub id: String,
    pub start: usize,
    pub length: usize,
    pub biological: bool,
}

impl FragmentInfo {
    pub fn new(id: impl Into<String>, start: usize, length: usize, biological: bool) -> Self {
        Self {
            id: id.into(),
            start,
            length,
            biological,
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// `None` when the fragment's extent does not fit in `usize`.
    pub fn checked_end(&self) -> Option<usize> {
        self.start.checked_add(self.length)
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.checked_end()
            .is_some_and(|end| self.start <= offset && offset < end)
    }
}

/// A contiguous run of fragments stored back-to-back, plus the row range and
/// fragment table the archive keeps for it.
#[derive(Clone, Debug)]
pub struct Blob {
    data: Vec<u8>,
    first_row: i64,
    row_count: u64,
    fragments: Vec<FragmentInfo>,
}

impl Blob {
    pub fn new(data: Vec<u8>, first_row: i64, row_count: u64, fragments: Vec<FragmentInfo>) -> Self {
        Self {
            data,
            first_row,
            row_count,
            fragments,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row_range(&self) -> (i64, u64) {
        (self.first_row, self.row_count)
    }

    pub fn fragments(&self) -> &[FragmentInfo] {
        &self.fragments
    }

    /// Rows covered by the blob, rendered as `first-last`. A blob without
    /// rows renders as `first-` so it never reads as a backwards range.
    pub fn row_label(&self) -> String {
        let (first, count) = self.row_range();
        match count {
            0 => format!("{first}-"),
            _ => {
                let last = i64::try_from(count - 1)
                    .ok()
                    .and_then(|span| first.checked_add(span));
                match last {
                    Some(last) => format!("{first}-{last}"),
                    None => format!("{first}+{count}"),
                }
            }
        }
    }
}

/// A confirmed hit attributed to one fragment. The subject bytes are copied
/// out of the blob, so a match never keeps its blob alive.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Match {
    accession: String,
    fragment_id: String,
    #[serde(serialize_with = "serialize_subject")]
    subject: Vec<u8>,
}

impl Match {
    pub fn new(accession: impl Into<String>, fragment_id: impl Into<String>, subject: Vec<u8>) -> Self {
        Self {
            accession: accession.into(),
            fragment_id: fragment_id.into(),
            subject,
        }
    }

    pub fn accession(&self) -> &str {
        &self.accession
    }

    pub fn fragment_id(&self) -> &str {
        &self.fragment_id
    }

    pub fn subject(&self) -> &[u8] {
        &self.subject
    }

    pub fn subject_string(&self) -> String {
        String::from_utf8_lossy(&self.subject).into_owned()
    }
}

fn serialize_subject<S>(subject: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&String::from_utf8_lossy(subject))
}
