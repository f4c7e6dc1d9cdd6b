use clap::Parser;
use log::error;

use orangered::config::AppConfig;
use orangered::models::{PopularitySort, Vote};
use orangered::operations::comments::{handle_comments_command, CommentsOptions};
use orangered::operations::posts::{handle_posts_command, PostsOptions};
use orangered::operations::reply::{handle_reply_command, ReplyOptions};
use orangered::operations::submit::{handle_submit_command, SubmitOptions};
use orangered::operations::vote::{handle_vote_command, VoteOptions};

mod cli;

use cli::{Cli, Commands};

fn parse_sort(sort: &str) -> PopularitySort {
    match sort {
        "hot" => PopularitySort::Hot,
        "new" => PopularitySort::New,
        "rising" => PopularitySort::Rising,
        "top" => PopularitySort::Top,
        "controversial" => PopularitySort::Controversial,
        _ => PopularitySort::Default,
    }
}

fn parse_vote(dir: &str) -> Option<Vote> {
    match dir {
        "up" | "1" => Some(Vote::Up),
        "down" | "-1" => Some(Vote::Down),
        "remove" | "0" => Some(Vote::Remove),
        _ => None,
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::load();

    let outcome = match cli.command {
        Commands::Posts {
            count,
            subreddit,
            sort,
            brief,
        } => {
            let options = PostsOptions {
                count,
                subreddit,
                sort: parse_sort(&sort),
                brief,
            };
            handle_posts_command(options, config.anonymous_client()).await
        }
        Commands::Comments { link_id } => {
            let options = CommentsOptions { link_id };
            handle_comments_command(options, config.anonymous_client()).await
        }
        Commands::About { username } => {
            match config.anonymous_client().about_redditor(&username).await {
                Ok(redditor) => {
                    println!("{}", redditor);
                    Ok(())
                }
                Err(err) => Err(err),
            }
        }
        Commands::Subreddit { name } => {
            match config.anonymous_client().about_subreddit(&name).await {
                Ok(subreddit) => {
                    println!("{}", subreddit);
                    Ok(())
                }
                Err(err) => Err(err),
            }
        }
        Commands::Submit {
            subreddit,
            title,
            content,
            link,
        } => {
            let options = SubmitOptions {
                subreddit,
                title,
                content,
                link,
            };
            handle_submit_command(options, config).await
        }
        Commands::Reply { thing_id, text } => {
            let options = ReplyOptions { thing_id, text };
            handle_reply_command(options, config).await
        }
        Commands::Vote { id, dir } => match parse_vote(&dir) {
            Some(vote) => {
                let options = VoteOptions { id, vote };
                handle_vote_command(options, config).await
            }
            None => {
                eprintln!("unknown vote direction '{}'; use up, down or remove", dir);
                std::process::exit(2);
            }
        },
    };

    if let Err(err) = outcome {
        error!("{}", err);
        std::process::exit(1);
    }
}
