use std::fmt::Write as _;

use crate::domain::{ClassificationRequest, OTHER_CATEGORY};

pub fn build_prompt(request: &ClassificationRequest) -> String {
    let mut prompt = String::from(
        "Analyze this bookmark and provide:\n\
         1. Whether this is a web article/blog post (true) or something else like a tool, homepage, documentation, etc. (false)\n\
         2. What type of content this is (e.g., \"article\", \"tool\", \"documentation\", \"homepage\", \"video\", \"repository\", etc.)\n\
         3. The title of the page",
    );

    match request.title.as_deref() {
        Some(title) => {
            let _ = write!(prompt, " (the provided title is: \"{title}\")");
        }
        None => prompt.push_str(
            " - extract this from the HTML content (check meta tags like og:title, twitter:title, or the <title> tag)",
        ),
    }

    prompt.push_str(
        "\n4. A brief summary (1-2 sentences) of what the page is about\n\
         5. 2-3 relevant categories or tags\n\n",
    );
    let _ = writeln!(prompt, "URL: {}", request.url);

    if let Some(content) = request.content.as_deref() {
        let _ = write!(prompt, "\nHTML Content:\n{content}\n");
    }

    if request.requires_category_match() {
        prompt.push_str(
            "\nAdditionally, if this is NOT an article, you MUST match it to exactly ONE category - \
             the single best match from this list:\n",
        );
        for candidate in &request.candidates {
            prompt.push_str(candidate);
            prompt.push('\n');
        }
        let _ = writeln!(
            prompt,
            "\nIMPORTANT: Return ONLY ONE category path that best matches the URL content. \
             If none of the categories are appropriate, return \"{OTHER_CATEGORY}\"."
        );
    }

    let _ = write!(
        prompt,
        "\nPlease respond in JSON format:\n\
         {{\n  \
           \"isArticle\": true or false,\n  \
           \"contentType\": \"article\" or \"tool\" or \"documentation\" etc.,\n  \
           \"title\": \"Title here\",\n  \
           \"summary\": \"Summary here\",\n  \
           \"categories\": [\"category1\", \"category2\", \"category3\"],\n  \
           \"matchedCategory\": \"Single/Best/Category/Path\" or \"{OTHER_CATEGORY}\" \
         (REQUIRED if not an article - return only ONE category)\n\
         }}"
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str, title: Option<&str>, content: Option<&str>) -> ClassificationRequest {
        ClassificationRequest {
            url: url.to_string(),
            title: title.map(str::to_string),
            content: content.map(str::to_string),
            candidates: vec![
                "Work".to_string(),
                "Work/Docs".to_string(),
                "Archive".to_string(),
            ],
        }
    }

    #[test]
    fn tool_urls_list_every_candidate_and_demand_one_match() {
        let prompt = build_prompt(&request("https://example.com/tool", None, None));
        assert!(prompt.contains("URL: https://example.com/tool"));
        assert!(prompt.contains("\nWork\nWork/Docs\nArchive\n"));
        assert!(prompt.contains("you MUST match it to exactly ONE category"));
        assert!(prompt.contains("return \"Other\""));
    }

    #[test]
    fn article_urls_skip_the_candidate_list() {
        let prompt = build_prompt(&request("https://example.com/blog/intro", None, None));
        assert!(!prompt.contains("you MUST match it"));
        assert!(!prompt.contains("Work/Docs"));
        assert!(prompt.contains("\"matchedCategory\""));
    }

    #[test]
    fn provided_title_is_echoed() {
        let prompt = build_prompt(&request("https://example.com/tool", Some("My Tool"), None));
        assert!(prompt.contains("(the provided title is: \"My Tool\")"));
        assert!(!prompt.contains("og:title"));
    }

    #[test]
    fn fetched_content_is_included_when_present() {
        let prompt = build_prompt(&request(
            "https://example.com/tool",
            None,
            Some("<title>Hi</title>"),
        ));
        assert!(prompt.contains("og:title"));
        assert!(prompt.contains("HTML Content:\n<title>Hi</title>"));

        let without = build_prompt(&request("https://example.com/tool", None, None));
        assert!(!without.contains("HTML Content"));
    }
}
