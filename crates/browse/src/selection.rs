/// Ordered set of selected ids (file ids on the documents tab, chunk ids on
/// the chunks tab).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s == id)
    }

    pub fn toggle(&mut self, id: &str) {
        if let Some(pos) = self.ids.iter().position(|s| s == id) {
            self.ids.remove(pos);
        } else {
            self.ids.push(id.to_string());
        }
    }

    /// Adds every id of the current page that is not selected yet.
    pub fn select_all<'a>(&mut self, page_ids: impl IntoIterator<Item = &'a str>) {
        for id in page_ids {
            if !self.contains(id) {
                self.ids.push(id.to_string());
            }
        }
    }

    /// Removes the ids of the current page, keeping selections on other pages.
    pub fn deselect_all<'a>(&mut self, page_ids: impl IntoIterator<Item = &'a str>) {
        let page: Vec<&str> = page_ids.into_iter().collect();
        self.ids.retain(|id| !page.contains(&id.as_str()));
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        let mut selection = Selection::new();
        selection.toggle("a");
        selection.toggle("b");
        selection.toggle("a");
        assert_eq!(selection.ids(), &["b".to_string()]);
    }

    #[test]
    fn test_page_selection_keeps_other_pages() {
        let mut selection = Selection::new();
        selection.toggle("other-page");
        selection.select_all(["p1", "p2", "other-page"]);
        assert_eq!(selection.len(), 3);

        selection.deselect_all(["p1", "p2"]);
        assert_eq!(selection.ids(), &["other-page".to_string()]);

        selection.clear();
        assert!(selection.is_empty());
    }
}
