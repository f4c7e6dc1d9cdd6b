use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "orangered",
    version = "0.1",
    about = "Rust client for the Reddit API."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Fetch posts from a subreddit or the frontpage.
    Posts {
        /// The number of posts to retrieve.
        #[arg(long, short, default_value = "10")]
        count: u32,

        /// The name of the subreddit to fetch posts from. If not provided,
        /// posts from the frontpage will be retrieved.
        #[arg(long, short)]
        subreddit: Option<String>,

        /// Sort order: hot, new, rising, top or controversial.
        #[arg(long, default_value = "new")]
        sort: String,

        /// Show posts in a brief one-line format.
        #[arg(long, short)]
        brief: bool,
    },

    /// Fetch the comment tree of a submission.
    Comments {
        /// Short id or t3_-prefixed full id of the submission.
        #[arg(help = "Submission id", required = true)]
        link_id: String,
    },

    /// Show info about a user.
    About {
        #[arg(help = "Username", required = true)]
        username: String,
    },

    /// Show info about a subreddit.
    Subreddit {
        #[arg(help = "Subreddit name", required = true)]
        name: String,
    },

    /// Submit a new post. Requires OAuth credentials in the environment
    /// (REDDIT_CLIENT_ID etc. or REDDIT_ACCESS_TOKEN).
    Submit {
        /// The name of the subreddit to post to.
        #[arg(help = "Subreddit name", required = true)]
        subreddit: String,

        /// Title of the post.
        #[arg(help = "Post title", required = true)]
        title: String,

        /// URL for a link post, body text for a self post.
        #[arg(help = "Post content", required = true)]
        content: String,

        /// Submit as a link post instead of a self post.
        #[arg(long)]
        link: bool,
    },

    /// Reply to a post or comment. Requires OAuth credentials.
    Reply {
        /// Full id of the parent: t3_xxx for posts, t1_xxx for comments.
        #[arg(help = "Parent full id", required = true)]
        thing_id: String,

        /// Text content of the reply.
        #[arg(help = "Reply text", required = true)]
        text: String,
    },

    /// Vote on a post or comment. Requires OAuth credentials.
    Vote {
        /// Full id of the target: t3_xxx for posts, t1_xxx for comments.
        #[arg(help = "Target full id", required = true)]
        id: String,

        /// Vote direction: up, down, or remove.
        #[arg(help = "Direction", required = true)]
        dir: String,
    },
}
