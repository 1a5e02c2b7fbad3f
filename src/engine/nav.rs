//! Stack-based navigation state for the remote hierarchy.

use crate::remote::ROOT_LOCATION_ID;

/// An addressable container in the remote hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub id: String,
    pub display_name: String,
}

impl Location {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    pub fn root() -> Self {
        Self::new(ROOT_LOCATION_ID, "/")
    }

    pub fn is_root(&self) -> bool {
        self.id == ROOT_LOCATION_ID
    }
}

/// Current location plus the history of locations entered to reach it.
///
/// The navigator is a pure value: listing fetches for the new location are
/// the engine's job, so enter/leave never fail.
#[derive(Debug, Clone)]
pub struct Navigator {
    current: Location,
    stack: Vec<Location>,
}

impl Navigator {
    pub fn new(start: Location) -> Self {
        Self {
            current: start,
            stack: Vec::new(),
        }
    }

    pub fn current(&self) -> &Location {
        &self.current
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Push the current location onto the history and move into `child`.
    pub fn enter(&mut self, child: Location) {
        let previous = std::mem::replace(&mut self.current, child);
        self.stack.push(previous);
    }

    /// Pop back to the most recently left location. An empty history is a
    /// no-op, not an error: `None` is returned and the current location is
    /// unchanged.
    pub fn leave(&mut self) -> Option<Location> {
        let previous = self.stack.pop()?;
        self.current = previous.clone();
        Some(previous)
    }

    /// Breadcrumb of display names from the oldest history entry to the
    /// current location.
    pub fn path(&self) -> String {
        let mut parts: Vec<&str> = self
            .stack
            .iter()
            .filter(|loc| !loc.is_root())
            .map(|loc| loc.display_name.as_str())
            .collect();
        if self.current.is_root() {
            if parts.is_empty() {
                return "/".to_string();
            }
        } else {
            parts.push(self.current.display_name.as_str());
        }
        format!("/{}", parts.join("/"))
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Location::root())
    }
}
