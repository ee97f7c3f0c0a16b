//! Command-line interface definitions for Awful News Post.
//!
//! All arguments can be provided via command-line flags; the feed URL can
//! also come from the environment.

use crate::feeds::DEFAULT_FEED_URL;
use crate::outputs::file::DEFAULT_OUTPUT;
use crate::steps::ranker::{DEFAULT_TOP_N, RankMode};
use crate::workflow::WorkflowOptions;
use clap::Parser;
use std::path::PathBuf;
use url::Url;

/// Command-line arguments for the Awful News Post application.
///
/// # Examples
///
/// ```sh
/// # Rank the latest issue, pick from the top 5, review and save
/// awful_news_post
///
/// # Let the model pick and skip review
/// awful_news_post --auto-select --no-review -o ./posts/today.txt
///
/// # A different feed, with two retries per model call
/// NEWS_FEED_URL=https://example.com/rss awful_news_post --llm-retries 2
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Newsletter feed to read the newest issue from
    #[arg(long, env = "NEWS_FEED_URL", default_value = DEFAULT_FEED_URL)]
    pub feed_url: Url,

    /// File the approved post is written to (overwritten)
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Template used to rank articles
    #[arg(long, default_value = "news_ranker")]
    pub ranker_template: String,

    /// Template used to write and revise the post
    #[arg(long, default_value = "post_writer")]
    pub writer_template: String,

    /// How many ranked candidates to offer for selection
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    pub top_n: usize,

    /// Let the model pick a single article; no selection prompt
    #[arg(long)]
    pub auto_select: bool,

    /// Save the first draft without asking for approval
    #[arg(long)]
    pub no_review: bool,

    /// Fail after this many revise requests
    #[arg(long)]
    pub max_revisions: Option<usize>,

    /// Extra attempts per model call on failure
    #[arg(long, default_value_t = 0)]
    pub llm_retries: usize,

    /// Write the final workflow state as JSON here
    #[arg(long)]
    pub state_dump: Option<PathBuf>,

    /// Print the workflow graph as Mermaid and exit
    #[arg(long)]
    pub print_graph: bool,
}

impl Cli {
    pub fn rank_mode(&self) -> RankMode {
        if self.auto_select {
            RankMode::Single
        } else {
            RankMode::from_top_n(self.top_n)
        }
    }

    pub fn workflow_options(&self) -> WorkflowOptions {
        WorkflowOptions {
            operator_selects: !self.auto_select,
            review: !self.no_review,
            max_revisions: self.max_revisions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["awful_news_post"]).unwrap();

        assert_eq!(cli.output, PathBuf::from("linkedin_post.txt"));
        assert_eq!(cli.ranker_template, "news_ranker");
        assert_eq!(cli.writer_template, "post_writer");
        assert_eq!(cli.top_n, 5);
        assert_eq!(cli.llm_retries, 0);
        assert!(cli.config.is_none());
        assert!(cli.state_dump.is_none());
        assert_eq!(cli.rank_mode(), RankMode::Multi { max: 5 });
        assert_eq!(cli.workflow_options(), WorkflowOptions::default());
    }

    #[test]
    fn test_cli_auto_select_no_review() {
        let cli = Cli::parse_from([
            "awful_news_post",
            "--auto-select",
            "--no-review",
            "-o",
            "/tmp/post.txt",
            "--max-revisions",
            "3",
            "--feed-url",
            "https://example.com/rss",
        ]);

        assert_eq!(cli.output, PathBuf::from("/tmp/post.txt"));
        assert_eq!(cli.feed_url.as_str(), "https://example.com/rss");
        assert_eq!(cli.rank_mode(), RankMode::Single);
        let options = cli.workflow_options();
        assert!(!options.operator_selects);
        assert!(!options.review);
        assert_eq!(options.max_revisions, Some(3));
    }

    #[test]
    fn test_cli_rejects_bad_url() {
        assert!(Cli::try_parse_from(["awful_news_post", "--feed-url", "not a url"]).is_err());
    }
}
