use dashmap::DashSet;
use log::info;

/// Known peer URLs, excluding this node's own URL
#[derive(Debug)]
pub struct PeerRegistry {
    current_node_url: String,
    peers: DashSet<String>,
}

impl PeerRegistry {
    /// Creates an empty registry for the node reachable at `current_node_url`
    pub fn new(current_node_url: impl Into<String>) -> Self {
        PeerRegistry {
            current_node_url: normalize(&current_node_url.into()),
            peers: DashSet::new(),
        }
    }

    /// Gets the URL peers use to reach this node
    pub fn current_node_url(&self) -> &str {
        &self.current_node_url
    }

    /// Adds a peer URL
    ///
    /// # Returns
    ///
    /// true if the peer was not known before. Empty URLs and this node's
    /// own URL are ignored.
    pub fn register(&self, url: &str) -> bool {
        let url = normalize(url);
        if url.is_empty() || url == self.current_node_url {
            return false;
        }

        let added = self.peers.insert(url.clone());
        if added {
            info!("Registered peer {}", url);
        }
        added
    }

    /// Adds every URL, returning how many were new
    pub fn register_bulk<S: AsRef<str>>(&self, urls: &[S]) -> usize {
        urls.iter().filter(|url| self.register(url.as_ref())).count()
    }

    /// Checks if a peer is known
    pub fn contains(&self, url: &str) -> bool {
        self.peers.contains(&normalize(url))
    }

    /// Gets every known peer URL, sorted
    pub fn peers(&self) -> Vec<String> {
        let mut peers: Vec<String> = self.peers.iter().map(|url| url.key().clone()).collect();
        peers.sort();
        peers
    }
}

fn normalize(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_ignores_duplicates_and_self() {
        let registry = PeerRegistry::new("http://localhost:3001/");

        assert!(registry.register("http://localhost:3002"));
        assert!(!registry.register("http://localhost:3002/"));
        assert!(!registry.register("http://localhost:3001"));
        assert!(!registry.register("  "));

        assert_eq!(registry.current_node_url(), "http://localhost:3001");
        assert_eq!(registry.peers(), vec!["http://localhost:3002"]);
    }

    #[test]
    fn test_register_bulk() {
        let registry = PeerRegistry::new("http://localhost:3001");

        let added = registry.register_bulk(&[
            "http://localhost:3003",
            "http://localhost:3001",
            "http://localhost:3002",
            "http://localhost:3003",
        ]);

        assert_eq!(added, 2);
        assert!(registry.contains("http://localhost:3002"));
        assert_eq!(
            registry.peers(),
            vec!["http://localhost:3002", "http://localhost:3003"]
        );
    }
}
