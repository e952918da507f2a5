use crate::error::LedgerError;

/// Ordered invocation arguments as the ledger carries them: a list of
/// byte strings. String arguments are encoded as UTF-8.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args(Vec<Vec<u8>>);

impl Args {
    pub fn new(args: Vec<Vec<u8>>) -> Self {
        Self(args)
    }

    pub fn from_strs(args: &[&str]) -> Self {
        Self(args.iter().map(|a| a.as_bytes().to_vec()).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Vec<u8>] {
        &self.0
    }

    /// Decode every argument as UTF-8. The first invalid argument fails
    /// the whole list with an Encoding error naming its position.
    pub fn to_strings(&self) -> Result<Vec<String>, LedgerError> {
        self.0
            .iter()
            .enumerate()
            .map(|(i, a)| {
                String::from_utf8(a.clone())
                    .map_err(|e| LedgerError::from(e).with_context(format!("argument {i}")))
            })
            .collect()
    }
}

impl From<Vec<Vec<u8>>> for Args {
    fn from(args: Vec<Vec<u8>>) -> Self {
        Self(args)
    }
}
