//! Known apps: category membership and display names.

use std::collections::BTreeMap;

use crate::models::AppCategory;

const CATEGORY_TABLE: &[(AppCategory, &[(&str, &str)])] = &[
    (
        AppCategory::Messaging,
        &[
            ("com.whatsapp", "WhatsApp"),
            ("com.facebook.orca", "Messenger"),
            ("com.viber.voip", "Viber"),
            ("org.telegram.messenger", "Telegram"),
            ("org.thoughtcrime.securesms", "Signal"),
        ],
    ),
    (
        AppCategory::Navigation,
        &[
            ("com.google.android.apps.maps", "Google Maps"),
            ("com.waze", "Waze"),
            ("com.mapbox.app", "Mapbox"),
        ],
    ),
    (
        AppCategory::Email,
        &[
            ("com.google.android.gm", "Gmail"),
            ("com.microsoft.office.outlook", "Outlook"),
            ("com.yahoo.mobile.client.android.mail", "Yahoo Mail"),
        ],
    ),
    (
        AppCategory::Social,
        &[
            ("com.facebook.katana", "Facebook"),
            ("com.twitter.android", "Twitter"),
            ("com.instagram.android", "Instagram"),
            ("com.snapchat.android", "Snapchat"),
        ],
    ),
    (
        AppCategory::Media,
        &[
            ("com.spotify.music", "Spotify"),
            ("com.netflix.mediaclient", "Netflix"),
            ("com.google.android.youtube", "YouTube"),
            ("com.pandora.android", "Pandora"),
        ],
    ),
];

/// Names users write in prompts, mapped to the package they refer to.
const NAME_TABLE: &[(&str, &str)] = &[
    ("WhatsApp", "com.whatsapp"),
    ("Gmail", "com.google.android.gm"),
    ("Google Maps", "com.google.android.apps.maps"),
    ("Maps", "com.google.android.apps.maps"),
    ("Netflix", "com.netflix.mediaclient"),
    ("Chrome", "com.android.chrome"),
    ("Spotify", "com.spotify.music"),
    ("Facebook", "com.facebook.katana"),
    ("Instagram", "com.instagram.android"),
    ("YouTube", "com.google.android.youtube"),
    ("Messenger", "com.facebook.orca"),
    ("Telegram", "org.telegram.messenger"),
    ("Signal", "org.thoughtcrime.securesms"),
    ("Waze", "com.waze"),
    ("Outlook", "com.microsoft.office.outlook"),
    ("Slack", "com.Slack"),
    ("Teams", "com.microsoft.teams"),
    ("Zoom", "us.zoom.videomeetings"),
];

/// Lookup tables for app categories and names. Package lookups are
/// case-insensitive.
#[derive(Debug, Clone)]
pub struct AppCatalog {
    categories: BTreeMap<AppCategory, Vec<String>>,
    package_category: BTreeMap<String, AppCategory>,
    package_names: BTreeMap<String, String>,
    name_packages: Vec<(String, String)>,
}

impl Default for AppCatalog {
    fn default() -> Self {
        let mut categories = BTreeMap::new();
        let mut package_category = BTreeMap::new();
        let mut package_names = BTreeMap::new();

        for (category, apps) in CATEGORY_TABLE {
            let packages = apps
                .iter()
                .map(|(package, name)| {
                    package_category.insert(package.to_lowercase(), *category);
                    package_names.insert(package.to_lowercase(), name.to_string());
                    package.to_string()
                })
                .collect();
            categories.insert(*category, packages);
        }

        for (name, package) in NAME_TABLE {
            package_names
                .entry(package.to_lowercase())
                .or_insert_with(|| name.to_string());
        }

        let mut name_packages: Vec<(String, String)> = NAME_TABLE
            .iter()
            .map(|(name, package)| (name.to_string(), package.to_string()))
            .collect();
        // Longer names first so "Google Maps" wins over "Maps".
        name_packages.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        Self {
            categories,
            package_category,
            package_names,
            name_packages,
        }
    }
}

impl AppCatalog {
    pub fn packages_for(&self, category: AppCategory) -> &[String] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn category_of(&self, package_name: &str) -> Option<AppCategory> {
        self.package_category
            .get(&package_name.to_lowercase())
            .copied()
    }

    pub fn display_name(&self, package_name: &str) -> Option<&str> {
        self.package_names
            .get(&package_name.to_lowercase())
            .map(String::as_str)
    }

    /// Resolve a user-facing app name ("whatsapp", "Google Maps") to a package.
    pub fn package_for_name(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.name_packages
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(_, package)| package.as_str())
    }

    /// Known app names with their packages, longest name first.
    pub fn named_apps(&self) -> impl Iterator<Item = (&str, &str)> {
        self.name_packages
            .iter()
            .map(|(name, package)| (name.as_str(), package.as_str()))
    }
}
