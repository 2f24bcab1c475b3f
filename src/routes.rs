//! The site's route surface and the CMS document behind each route.

use serde::Serialize;
use std::fmt;

/// A content-bound page (or shared fragment) of the site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "page", content = "id", rename_all = "snake_case")]
pub enum PageKey {
    Home,
    About,
    Contact,
    Projects,
    Project(String),
    Solutions,
    Solution(String),
    Investors,
    News,
    Privacy,
    Terms,
    /// Navbar and footer copy shared by every page.
    Navigation,
}

impl PageKey {
    /// Resolve a public path such as `/projects/42` to its page.
    ///
    /// Trailing slashes are ignored. Returns `None` for anything outside the
    /// route surface, including deeper investor subpaths.
    pub fn from_path(path: &str) -> Option<PageKey> {
        let segments: Vec<&str> = path
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let page = match segments.as_slice() {
            [] => PageKey::Home,
            ["about"] => PageKey::About,
            ["contact"] => PageKey::Contact,
            ["projects"] => PageKey::Projects,
            ["projects", id] => PageKey::Project((*id).to_string()),
            ["solutions"] => PageKey::Solutions,
            ["solutions", id] => PageKey::Solution((*id).to_string()),
            ["investors"] => PageKey::Investors,
            ["news"] => PageKey::News,
            ["privacy"] => PageKey::Privacy,
            ["terms"] => PageKey::Terms,
            _ => return None,
        };
        Some(page)
    }

    /// Public path of the page. `Navigation` has none of its own.
    pub fn path(&self) -> Option<String> {
        let path = match self {
            PageKey::Home => "/".to_string(),
            PageKey::About => "/about".to_string(),
            PageKey::Contact => "/contact".to_string(),
            PageKey::Projects => "/projects".to_string(),
            PageKey::Project(id) => format!("/projects/{}", id),
            PageKey::Solutions => "/solutions".to_string(),
            PageKey::Solution(id) => format!("/solutions/{}", id),
            PageKey::Investors => "/investors".to_string(),
            PageKey::News => "/news".to_string(),
            PageKey::Privacy => "/privacy".to_string(),
            PageKey::Terms => "/terms".to_string(),
            PageKey::Navigation => return None,
        };
        Some(path)
    }

    /// CMS document type holding this page's copy.
    pub fn document_type(&self) -> &'static str {
        match self {
            PageKey::Home => "homePage",
            PageKey::About => "aboutPage",
            PageKey::Contact => "contactPage",
            PageKey::Projects => "projectsPage",
            PageKey::Project(_) => "project",
            PageKey::Solutions => "solutionsPage",
            PageKey::Solution(_) => "solution",
            PageKey::Investors => "investorsPage",
            PageKey::News => "newsPage",
            PageKey::Privacy => "privacyPage",
            PageKey::Terms => "termsPage",
            PageKey::Navigation => "navigation",
        }
    }

    /// Page-specific key for collection documents (project/solution slug).
    pub fn slug(&self) -> Option<&str> {
        match self {
            PageKey::Project(id) | PageKey::Solution(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slug() {
            Some(slug) => write!(f, "{}:{}", self.document_type(), slug),
            None => f.write_str(self.document_type()),
        }
    }
}
