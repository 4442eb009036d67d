use crate::error::Result;
use crate::external::get;

/// Fetch the trove classifier list, one classifier per line
pub fn get_classifiers(url: &str) -> Result<Vec<String>> {
    let body = get(url, "classifier list")?.text()?;
    Ok(body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Classifiers containing `query`, ignoring case and surrounding whitespace
pub fn search<'c>(classifiers: &'c [String], query: &str) -> Vec<&'c str> {
    let query = query.trim().to_lowercase();
    classifiers
        .iter()
        .filter(|classifier| classifier.to_lowercase().contains(&query))
        .map(String::as_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[test]
    fn search_fetched_classifiers() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/classifiers")
            .with_status(200)
            .with_body("Development Status :: 3 - Alpha\nLicense :: OSI Approved :: MIT License\n\nTopic :: Utilities\n")
            .create();

        let classifiers = get_classifiers(&format!("{}/classifiers", server.url())).unwrap();
        mock.assert();
        assert_eq!(classifiers.len(), 3);

        assert_eq!(
            search(&classifiers, "  mit "),
            vec!["License :: OSI Approved :: MIT License"]
        );
        assert!(search(&classifiers, "django").is_empty());
    }
}
