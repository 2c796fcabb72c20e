#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: Option<i64>,
    pub name: String,
}

impl Event {
    #[cfg(test)]
    pub fn new(name: String) -> Self {
        Self { id: None, name }
    }

    /// Find an event by name (case-insensitive) in a slice.
    pub fn find_by_name<'a>(events: &'a [Event], name: &str) -> Option<&'a Event> {
        let lower = name.to_lowercase();
        events.iter().find(|e| e.name.to_lowercase() == lower)
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
