//! Selection controller: the single owner of the current conversation identifier.
//!
//! Two transitions keep the identifier and the navigable path consistent:
//!
//! - [`SelectionController::derive_from_path`] runs on mount and after back/forward.
//!   It adopts the identifier the path names when the directory knows it, otherwise the
//!   first listed identifier, otherwise `""`. It only ever *replaces* the current
//!   history entry, so an unknown deep link is corrected in place and back/forward never
//!   lands on a route that immediately redirects.
//! - [`SelectionController::select`] is an explicit user choice. A new identifier gets a
//!   fresh history entry; re-selecting the current one only repairs the URL in place.
//!
//! Both return whether the identifier changed, which is the caller's cue to clear the
//! raw export and start a new load.

use tracing::debug;

use super::directory::ConversationDirectory;
use super::navigation::NavigationAdapter;
use crate::utils::ChatPaths;

#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    current: String,
    paths: ChatPaths,
}

impl SelectionController {
    pub fn new(paths: ChatPaths) -> Self {
        Self { current: String::new(), paths }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    /// Explicit selection. Returns `true` when the current identifier changed.
    pub fn select<N: NavigationAdapter>(&mut self, navigation: &mut N, target: &str) -> bool {
        let target_path = self.paths.client_path(target);
        let changed = self.current != target;

        if changed {
            debug!(from = %self.current, to = %target, "Selection changed");
            self.current = target.to_string();
            if navigation.current_path() != target_path {
                navigation.push_path(&target_path, history_state_for(target));
                return true;
            }
        }

        self.reconcile_in_place(navigation, &target_path);
        changed
    }

    /// Re-derive the identifier from the current path. Idempotent: a second call with
    /// the same directory and path writes nothing.
    pub fn derive_from_path<N: NavigationAdapter>(
        &mut self,
        navigation: &mut N,
        directory: &ConversationDirectory,
    ) -> bool {
        let path = navigation.current_path();
        let from_path = self.paths.identifier_from_client_path(&path);

        let target = if !from_path.is_empty() && directory.contains(&from_path) {
            from_path
        } else {
            directory.first().unwrap_or_default().to_string()
        };

        let changed = self.current != target;
        if changed {
            debug!(%path, from = %self.current, to = %target, "Selection derived from path");
            self.current = target;
        }

        let target_path = self.paths.client_path(&self.current);
        self.reconcile_in_place(navigation, &target_path);
        changed
    }

    /// Replace the current entry when its path or stored identifier disagree
    fn reconcile_in_place<N: NavigationAdapter>(&self, navigation: &mut N, target_path: &str) {
        let state = history_state_for(&self.current);
        if navigation.current_path() != target_path || navigation.history_state() != state {
            debug!(path = %target_path, "Replacing history entry");
            navigation.replace_path(target_path, state);
        }
    }
}

/// The root entry carries no identifier
fn history_state_for(id: &str) -> Option<String> {
    (!id.is_empty()).then(|| id.to_string())
}
