/// Resolves stored image references into fetchable URLs.
///
/// The provider (cloud) name is injected at construction; resolution never
/// fails, it only degrades. Callers that need a fetchable URL must still
/// check for an absolute scheme, since an unresolvable local reference is
/// handed back unchanged.
#[derive(Debug, Clone)]
pub struct ImageResolver {
    cloud_name: Option<String>,
}

impl ImageResolver {
    pub fn new(cloud_name: Option<String>) -> Self {
        Self { cloud_name }
    }

    pub fn resolve(&self, reference: &str) -> Option<String> {
        if reference.is_empty() {
            return None;
        }
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return Some(reference.to_string());
        }
        if let Some(filename) = reference.strip_prefix("/media/") {
            if let Some(cloud_name) = &self.cloud_name {
                return Some(format!(
                    "https://res.cloudinary.com/{cloud_name}/image/upload/{filename}"
                ));
            }
        }
        Some(reference.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_urls_pass_through() {
        let resolver = ImageResolver::new(Some("demo".into()));
        assert_eq!(
            resolver.resolve("https://example.com/a.jpg").as_deref(),
            Some("https://example.com/a.jpg")
        );
    }

    #[test]
    fn media_paths_rewrite_to_provider_url() {
        let resolver = ImageResolver::new(Some("demo".into()));
        assert_eq!(
            resolver.resolve("/media/shirts/blue.jpg").as_deref(),
            Some("https://res.cloudinary.com/demo/image/upload/shirts/blue.jpg")
        );
    }

    #[test]
    fn media_paths_without_provider_stay_unchanged() {
        let resolver = ImageResolver::new(None);
        assert_eq!(
            resolver.resolve("/media/shirts/blue.jpg").as_deref(),
            Some("/media/shirts/blue.jpg")
        );
    }

    #[test]
    fn empty_reference_resolves_to_none() {
        let resolver = ImageResolver::new(Some("demo".into()));
        assert_eq!(resolver.resolve(""), None);
    }
}
