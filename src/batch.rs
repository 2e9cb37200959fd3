/// Outcome for one identifier of a batch operation.
#[derive(Debug)]
pub struct ItemOutcome<T> {
    pub file_id: String,
    pub result: anyhow::Result<T>,
}

impl<T> ItemOutcome<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-identifier results of [`Client::update`](crate::Client::update) and
/// [`Client::download_files`](crate::Client::download_files), in input order.
///
/// A failed identifier never stops the batch; look here (or at the `warn` logs)
/// to see which ones did not go through.
#[derive(Debug)]
pub struct BatchReport<T> {
    outcomes: Vec<ItemOutcome<T>>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            outcomes: Vec::new(),
        }
    }
}

impl<T> BatchReport<T> {
    pub(crate) fn push(&mut self, file_id: &str, result: anyhow::Result<T>) {
        self.outcomes.push(ItemOutcome {
            file_id: file_id.to_string(),
            result,
        });
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn is_all_ok(&self) -> bool {
        self.outcomes.iter().all(ItemOutcome::is_ok)
    }

    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &T)> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            Ok(v) => Some((o.file_id.as_str(), v)),
            Err(_) => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &anyhow::Error)> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            Ok(_) => None,
            Err(e) => Some((o.file_id.as_str(), e)),
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ItemOutcome<T>> {
        self.outcomes.iter()
    }

    pub fn into_outcomes(self) -> Vec<ItemOutcome<T>> {
        self.outcomes
    }
}

impl<T> IntoIterator for BatchReport<T> {
    type Item = ItemOutcome<T>;
    type IntoIter = std::vec::IntoIter<ItemOutcome<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a BatchReport<T> {
    type Item = &'a ItemOutcome<T>;
    type IntoIter = std::slice::Iter<'a, ItemOutcome<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.iter()
    }
}
