// Heuristic cluster namer — the default naming backend.
//
// Maps dominant keywords through a table of known complaint categories
// ("crash" → App Crashes) and falls back to composing a name from the top
// keywords. Zero API calls, always succeeds.

use anyhow::Result;

use super::traits::ClusterNamer;

/// Known complaint categories, matched by substring against the top
/// keywords. Order matters: earlier patterns win.
const CATEGORY_PATTERNS: &[(&str, &str, &str)] = &[
    ("crash", "App Crashes", "Issues related to app crashes and instability"),
    ("bug", "Bug Reports", "Various bugs and software defects reported by users"),
    ("slow", "Performance Issues", "Complaints about slow performance and responsiveness"),
    ("battery", "Battery Drain", "Issues with excessive battery consumption"),
    ("login", "Authentication Problems", "Difficulties with login and account access"),
    ("sync", "Synchronization Issues", "Problems with data syncing across devices"),
    ("notification", "Notification Problems", "Issues with push notifications and alerts"),
    ("interface", "User Interface Issues", "Problems with app design and usability"),
    ("feature", "Missing Features", "Requests for missing or desired functionality"),
    ("ads", "Advertisement Issues", "Complaints about ads and monetization"),
    ("payment", "Payment Problems", "Issues with purchases and billing"),
    ("update", "Update Issues", "Problems after app updates"),
    ("loading", "Loading Problems", "Issues with content loading and connectivity"),
    ("account", "Account Issues", "Problems with user accounts and profiles"),
    ("connection", "Connectivity Issues", "Network and internet connection problems"),
    ("storage", "Storage Problems", "Issues with storage space and memory"),
];

/// Table-driven namer. Stateless.
pub struct HeuristicNamer;

impl ClusterNamer for HeuristicNamer {
    fn name_cluster(&self, keywords: &[String], _sample_texts: &[String]) -> Result<(String, String)> {
        if keywords.is_empty() {
            return Ok((
                "General Issues".to_string(),
                "Miscellaneous user complaints and issues".to_string(),
            ));
        }

        // Match the category table against the top three keywords.
        for (pattern, name, description) in CATEGORY_PATTERNS {
            if keywords
                .iter()
                .take(3)
                .any(|kw| kw.to_lowercase().contains(pattern))
            {
                return Ok((name.to_string(), description.to_string()));
            }
        }

        // No known category — compose from the top keywords.
        let name = if keywords.len() >= 2 {
            format!("{} and {} Issues", title_case(&keywords[0]), title_case(&keywords[1]))
        } else {
            format!("{} Issues", title_case(&keywords[0]))
        };

        let top: Vec<String> = keywords.iter().take(3).map(|k| k.to_lowercase()).collect();
        let description = format!("User complaints primarily about {}", top.join(", "));

        Ok((name, description))
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
