mod api;
mod config;
mod feed;
mod post;
mod query;
mod render;

use std::error::Error;

use api::FeedClient;
use config::{Command, Config};
use feed::{FeedPipeline, LoadOutcome};
use log::{info, warn};
use post::{NewPost, PostPatch};
use query::SortOrder;
use render::TerminalSink;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::parse();
    let client = FeedClient::new(&config);

    match config.command() {
        Command::Feed {
            pages,
            all,
            search,
            sort,
        } => {
            let pipeline = FeedPipeline::new(client, TerminalSink::new(), config.page_size());

            let mut remaining = if *all { u32::MAX } else { *pages };
            while remaining > 0 {
                match pipeline.load_next_page().await? {
                    LoadOutcome::Loaded(count) => {
                        info!("loaded {count} posts");
                        remaining -= 1;
                    }
                    _ => break,
                }
            }

            if let Some(text) = search {
                pipeline.apply_filter(text);
            }
            if *sort != SortOrder::Unsorted {
                pipeline.apply_sort(*sort);
            }
            info!("{} posts shown", pipeline.visible().len());
        }
        Command::Show { id } => {
            let post = client.get_post(*id).await?;
            println!("{}", render::article(&post));
        }
        Command::Create {
            title,
            body,
            media,
            tags,
        } => {
            let new_post = NewPost {
                title: title.clone(),
                body: body.clone(),
                media: media.clone(),
                tags: tags.clone(),
            };
            new_post.validate()?;

            let created = client.create_post(&new_post).await?;
            info!("published post {}", created.id);
            refresh_feed(client, &config).await?;
        }
        Command::Edit {
            id,
            title,
            body,
            media,
        } => {
            let patch = PostPatch {
                title: title.clone(),
                body: body.clone(),
                media: media.clone(),
            };
            patch.validate()?;

            let updated = client.update_post(*id, &patch).await?;
            info!("updated post {}", updated.id);
            refresh_feed(client, &config).await?;
        }
        Command::Delete { id, yes } => {
            if !*yes {
                warn!("refusing to delete post {id} without --yes");
                return Ok(());
            }
            client.delete_post(*id).await?;
            info!("deleted post {id}");
            refresh_feed(client, &config).await?;
        }
    }

    Ok(())
}

/// A mutation invalidates whatever the feed showed before, so show it fresh.
async fn refresh_feed(client: FeedClient, config: &Config) -> Result<(), Box<dyn Error>> {
    let pipeline = FeedPipeline::new(client, TerminalSink::new(), config.page_size());
    pipeline.refresh().await?;
    Ok(())
}
