//! Fixed rubrics sent to the language model.
//!
//! The chat templates loaded from the `awful_aj` config directory carry the
//! system prompt; the text built here is the user message.

use crate::models::{Article, ReviewFeedback};

pub const SINGLE_PICK_RUBRIC: &str = r#"
Select the most relevant article from the provided list of news articles.
Respond only with the article number (0-based index, so 0 for the first article, 1 for the second, etc.).
Only the number, nothing else.
"#;

pub const MULTI_PICK_RUBRIC: &str = r#"
Rank the most relevant articles from the provided list of news articles.
Respond only with a comma-separated list of article numbers, most relevant first
(0-based index, so 0 for the first article, 1 for the second, etc.), for example: 3,0,5
Return at most {max} numbers and nothing else.
"#;

pub const RELEVANCE_CRITERIA: &str = r#"
Relevance should be based on:

1. Scientific breakthroughs in Artificial Intelligence (new publications, new approaches, new models, new open-source libraries).
2. Technical innovations and disruptions in Artificial Intelligence for the domains: manufacturing, computer vision, robotics, and aerospace.
3. The article should be recent (published within the last 4 weeks).

Here are the articles to choose from:
"#;

pub const POST_RUBRIC: &str = r#"
Create an engaging LinkedIn post. Follow these guidelines:

STRUCTURE:
1. Hook (1 line): Start with a compelling insight or observation
2. Context (2-3 lines): Connect the topic to real-world impact
3. Key Insights (2-4 lines): Share main takeaways in clear, concise points
4. Value (1 line): Highlight professional significance
5. Call to Action: End with an engaging question or prompt

WRITING STYLE:
- Use clear, straightforward language
- Write short, impactful sentences
- Organize ideas with bullet points
- Add frequent line breaks between concepts
- Use active voice
- Focus on practical, actionable insights
- Support points with specific examples or data
- Address the reader directly using "you" and "your"
- Pose thought-provoking questions
- Skip introductory phrases like "in conclusion" or "in summary"
- Avoid warnings, notes, or unnecessary extras

AVOID:
- Emojis, hashtags, semicolons, and asterisks
- Clichés and metaphors
- Broad generalizations
- Passive voice
- These words: Accordingly, Additionally, Arguably, Certainly, Consequently, Hence, However, Indeed, Moreover, Nevertheless, Nonetheless, Notwithstanding, Thus, Undoubtedly, Adept, Commendable, Dynamic
"#;

/// Enumerate candidates as `"{i}. {title}\n{body}"`, separated by blank lines.
pub fn enumerate_articles(articles: &[&Article]) -> String {
    articles
        .iter()
        .enumerate()
        .map(|(i, a)| format!("{}. {}\n{}", i, a.title, a.body))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Prompt for the relevance ranker. `max == None` asks for a single index.
pub fn ranking_prompt(articles: &[&Article], max: Option<usize>) -> String {
    let instructions = match max {
        None => SINGLE_PICK_RUBRIC.to_string(),
        Some(max) => MULTI_PICK_RUBRIC.replace("{max}", &max.to_string()),
    };
    format!(
        "{}{}{}",
        instructions,
        RELEVANCE_CRITERIA,
        enumerate_articles(articles)
    )
}

fn describe(article: &Article) -> String {
    let mut out = format!("Title: {}\n", article.title);
    if !article.source_url.is_empty() {
        out.push_str(&format!("Source: {}\n", article.source_url));
    }
    out.push_str(&format!("Category: {}\n\n{}", article.category, article.body));
    out
}

/// First-pass prompt: rubric plus the raw article.
pub fn draft_prompt(article: &Article) -> String {
    format!(
        "{}\nArticle to write about:\n{}\n",
        POST_RUBRIC,
        describe(article)
    )
}

/// Revise-pass prompt: rubric, the article for grounding, the previous
/// draft and the operator's feedback verbatim.
pub fn revision_prompt(article: &Article, previous: &str, feedback: &ReviewFeedback) -> String {
    format!(
        "{}\nRewrite the draft below so it addresses the reviewer's feedback while keeping to the guidelines above.\n\n\
         Article the post is about:\n{}\n\n\
         Previous draft (revision {}):\n{}\n\n\
         Reviewer feedback:\n{}\n",
        POST_RUBRIC,
        describe(article),
        feedback.revision,
        previous,
        feedback.text
    )
}
