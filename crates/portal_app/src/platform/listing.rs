/// Files the next page render will list. The portal has no listing endpoint,
/// so the console tracks uploads and deletions it has seen succeed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Listing {
    identifiers: Vec<String>,
}

impl Listing {
    pub fn new(identifiers: impl IntoIterator<Item = String>) -> Self {
        let mut listing = Self::default();
        for identifier in identifiers {
            listing.add(identifier);
        }
        listing
    }

    /// Adding a listed identifier again changes nothing. The service keeps a
    /// duplicate upload under a timestamped name, so the listing misses that
    /// copy until the portal is restarted with a fresh file list.
    pub fn add(&mut self, identifier: String) {
        if !self.identifiers.contains(&identifier) {
            self.identifiers.push(identifier);
        }
    }

    pub fn remove(&mut self, identifier: &str) -> bool {
        let before = self.identifiers.len();
        self.identifiers.retain(|existing| existing != identifier);
        self.identifiers.len() != before
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.identifiers.clone()
    }
}
