//! Filtering and pagination of the application set for display.
//!
//! Pure functions over borrowed data; nothing here touches the backend.

use std::collections::HashMap;

use portal_core::{
  application::{Application, ApplicationId},
  score::{MatchScore, ScoreBand},
  session::ViewerRole,
};

/// Page sizes the dashboard offers.
pub const PAGE_SIZES: [usize; 3] = [5, 10, 25];

pub const DEFAULT_PAGE_SIZE: usize = PAGE_SIZES[0];

/// Search text and pagination position for one view of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
  search:    String,
  page:      usize,
  page_size: usize,
}

impl Default for ViewState {
  fn default() -> Self { Self::new(DEFAULT_PAGE_SIZE) }
}

impl ViewState {
  pub fn new(page_size: usize) -> Self {
    Self {
      search: String::new(),
      page: 0,
      page_size,
    }
  }

  pub fn search(&self) -> &str { &self.search }

  pub fn page(&self) -> usize { self.page }

  pub fn page_size(&self) -> usize { self.page_size }

  /// Changing the search text returns to the first page.
  pub fn set_search(&mut self, search: impl Into<String>) {
    let search = search.into();
    if search != self.search {
      self.search = search;
      self.page = 0;
    }
  }

  pub fn set_page(&mut self, page: usize) { self.page = page; }

  /// Changing the page size returns to the first page.
  pub fn set_page_size(&mut self, page_size: usize) {
    if page_size != self.page_size {
      self.page_size = page_size;
      self.page = 0;
    }
  }

  pub fn project(
    &self,
    applications: &[Application],
    scores: &HashMap<ApplicationId, MatchScore>,
    role: ViewerRole,
  ) -> Page {
    project(
      applications,
      scores,
      role,
      &self.search,
      self.page,
      self.page_size,
    )
  }
}

/// One displayed application with its score decorations.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
  pub application: Application,
  pub score:       MatchScore,
  pub band:        ScoreBand,
  /// Progress-bar position in `[0, 100]`.
  pub progress:    u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
  pub rows:          Vec<Row>,
  /// Matches across all pages.
  pub total_matches: usize,
  pub page:          usize,
  pub page_size:     usize,
}

impl Page {
  pub fn page_count(&self) -> usize {
    if self.page_size == 0 {
      0
    } else {
      self.total_matches.div_ceil(self.page_size)
    }
  }
}

/// Case-insensitive substring match on the job title. Recruiters also match
/// on the candidate's username. An empty needle matches everything.
pub fn matches(application: &Application, role: ViewerRole, needle: &str) -> bool {
  let needle = needle.trim().to_lowercase();
  if needle.is_empty() {
    return true;
  }
  application.job_title.to_lowercase().contains(&needle)
    || (role == ViewerRole::Recruiter && application.candidate.to_lowercase().contains(&needle))
}

/// Filter `applications` by `search`, then take page `page` of `page_size`.
///
/// Order is preserved. A page past the end, or a zero page size, yields no
/// rows; `total_matches` is still reported.
pub fn project(
  applications: &[Application],
  scores: &HashMap<ApplicationId, MatchScore>,
  role: ViewerRole,
  search: &str,
  page: usize,
  page_size: usize,
) -> Page {
  let filtered: Vec<&Application> = applications
    .iter()
    .filter(|a| matches(a, role, search))
    .collect();

  let rows = match page.checked_mul(page_size) {
    Some(start) if page_size > 0 && start < filtered.len() => filtered[start..]
      .iter()
      .take(page_size)
      .map(|&app| {
        let score = scores.get(&app.id).copied().unwrap_or_default();
        Row {
          application: app.clone(),
          score,
          band: score.band(),
          progress: score.progress(),
        }
      })
      .collect(),
    _ => Vec::new(),
  };

  Page {
    rows,
    total_matches: filtered.len(),
    page,
    page_size,
  }
}
