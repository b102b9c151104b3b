use std::collections::BTreeSet;

/// Rows shown in the link grid.
pub const GRID_ROWS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    Open { index: usize, url: String },
    Close { index: usize },
}

/// Links listed under the address bar and which of them are open.
#[derive(Debug, Clone, Default)]
pub struct LinkGrid {
    links: Vec<String>,
    open: BTreeSet<usize>,
}

impl LinkGrid {
    pub fn set_links(&mut self, links: Vec<String>) {
        self.links = links;
        let shown = self.shown_len();
        self.open.retain(|&i| i < shown);
    }

    /// Links that currently have a row.
    pub fn shown(&self) -> &[String] {
        &self.links[..self.shown_len()]
    }

    pub fn is_open(&self, index: usize) -> bool {
        self.open.contains(&index)
    }

    /// Open the link in row `index`, or close it if it is already open.
    pub fn toggle(&mut self, index: usize) -> Option<LinkAction> {
        let url = self.shown().get(index)?.clone();
        if self.open.remove(&index) {
            Some(LinkAction::Close { index })
        } else {
            self.open.insert(index);
            Some(LinkAction::Open { index, url })
        }
    }

    fn shown_len(&self) -> usize {
        self.links.len().min(GRID_ROWS)
    }
}
