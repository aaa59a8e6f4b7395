use std::sync::Arc;

use clap::{Parser, Subcommand};

use mangadl::browser::{BrowserConfig, ChromeSession};
use mangadl::events::{ChapterEvent, ChaptersEvent, VolumeEvent, VolumesEvent};
use mangadl::helpers::bytes_to_size;
use mangadl::{
    ChapterOptions, ChaptersOptions, Config, Downloader, Fetcher, Result, VolumeOptions,
};

#[derive(Parser)]
#[command(name = "mangadl", version, about = "Manga chapter and volume downloader")]
struct Cli {
    /// Output directory for images and archives.
    #[arg(long, global = true)]
    output: Option<String>,

    /// Site origin to use instead of the published one.
    #[arg(long, global = true)]
    website: Option<String>,

    /// Abort non-essential page resources while downloading.
    #[arg(long, global = true)]
    fast: bool,

    /// Run the browser with a visible window.
    #[arg(long, global = true)]
    visible: bool,

    /// Walk the pipelines and emit events without fetching images.
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show volume and chapter counts for a series.
    Info { manga: String },

    /// Search the site for series matching a query.
    Search { query: String },

    /// Download one chapter.
    Chapter {
        manga: String,
        chapter: f64,
        #[command(flatten)]
        download: DownloadArgs,
    },

    /// Download a chapter range.
    Chapters {
        manga: String,
        start: f64,
        end: f64,
        /// Pack the whole range into one archive.
        #[arg(long)]
        compress_as_one: bool,
        #[command(flatten)]
        download: DownloadArgs,
    },

    /// Download one volume.
    Volume {
        manga: String,
        volume: u32,
        #[command(flatten)]
        download: DownloadArgs,
    },

    /// Download a volume range.
    Volumes {
        manga: String,
        start: u32,
        end: u32,
        #[command(flatten)]
        download: DownloadArgs,
    },
}

#[derive(clap::Args)]
struct DownloadArgs {
    /// Pack the downloaded unit into a CBZ archive.
    #[arg(long)]
    compress: bool,

    /// Remove the image folders once the archive is written.
    #[arg(long)]
    delete_after: bool,

    /// Re-download pages that already exist on disk.
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = Config::load();
    if let Some(output) = cli.output {
        config.output_directory = output;
    }
    config.flags.fast |= cli.fast;
    config.flags.visible |= cli.visible;
    config.flags.mock |= cli.mock;

    let browser_config = if config.flags.visible {
        BrowserConfig::visible()
    } else {
        config.browser.clone()
    };
    let session = Arc::new(ChromeSession::launch(browser_config)?);

    let mut fetcher = Fetcher::new(session, &config, mangadl::website::DEFAULT_WEBSITE);
    match cli.website {
        Some(website) => fetcher.website = website,
        None => fetcher.fix_current_website().await,
    }

    let downloader = Downloader::new(fetcher, &config);

    match cli.command {
        Command::Info { manga } => {
            let stats = downloader.fetcher.fetch_stats(&manga).await?;
            println!("{} ({})", stats.display, stats.name);
            println!("volumes:  {}", stats.volumes);
            println!("chapters: {}", stats.chapters);
            if !stats.synopsis.is_empty() {
                println!("\n{}", stats.synopsis);
            }
        }
        Command::Search { query } => {
            let results = downloader.fetcher.search_manga(&query).await?;
            if results.is_empty() {
                println!("no results for {:?}", query);
            }
            for result in results {
                match result.manga() {
                    Some(manga) => println!("{} ({})", result.name, manga),
                    None => println!("{}", result.name),
                }
            }
        }
        Command::Chapter {
            manga,
            chapter,
            download,
        } => {
            let options = ChapterOptions {
                force_download: download.force,
                compression: download.compress,
                delete_after_compression: download.delete_after,
            };
            downloader
                .download_chapter(&manga, chapter, options, &mut print_chapter_event)
                .await?;
        }
        Command::Chapters {
            manga,
            start,
            end,
            compress_as_one,
            download,
        } => {
            let options = ChaptersOptions {
                force_download: download.force,
                compression: download.compress,
                delete_after_compression: download.delete_after,
                compress_as_one,
            };
            downloader
                .download_chapters(&manga, start, end, options, &mut print_chapters_event)
                .await?;
        }
        Command::Volume {
            manga,
            volume,
            download,
        } => {
            let options = VolumeOptions {
                force_download: download.force,
                compression: download.compress,
                delete_after_compression: download.delete_after,
            };
            downloader
                .download_volume(&manga, volume, options, &mut print_volume_event)
                .await?;
        }
        Command::Volumes {
            manga,
            start,
            end,
            download,
        } => {
            let options = VolumeOptions {
                force_download: download.force,
                compression: download.compress,
                delete_after_compression: download.delete_after,
            };
            downloader
                .download_volumes(&manga, start, end, options, &mut print_volumes_event)
                .await?;
        }
    }

    Ok(())
}

fn print_chapter_event(event: ChapterEvent) {
    match event {
        ChapterEvent::Start { attributes, pages, .. } => {
            log::info!("{} {}: {} pages", attributes.manga, attributes.chapter, pages);
        }
        ChapterEvent::Page { attributes, total, .. } => {
            log::info!("page {}/{}", attributes.page, total);
        }
        ChapterEvent::NoImage { link, .. } => {
            log::warn!("no image on {}", link);
        }
        ChapterEvent::Compressing { path, .. } => {
            log::info!("compressing into {}", path.display());
        }
        ChapterEvent::Compressed { stats, .. } => {
            if stats.is_failure() {
                log::error!("archive failed");
            } else {
                log::info!("archived {} ({})", stats.path.display(), bytes_to_size(stats.size));
            }
        }
        ChapterEvent::Done { attributes, path } => {
            log::info!(
                "{} {} done: {}",
                attributes.manga,
                attributes.chapter,
                path.display()
            );
        }
    }
}

fn print_chapters_event(event: ChaptersEvent) {
    match event {
        ChaptersEvent::Start { manga, links } => {
            log::info!("{}: downloading {} chapters", manga, links.len());
        }
        ChaptersEvent::StartChapter {
            attributes,
            pages,
            current,
            total,
        } => {
            log::info!(
                "chapter {} ({}/{}): {} pages",
                attributes.chapter,
                current,
                total,
                pages
            );
        }
        ChaptersEvent::Page { attributes, total } => {
            log::info!("{} page {}/{}", attributes.chapter, attributes.page, total);
        }
        ChaptersEvent::NoImage { link, .. } => {
            log::warn!("no image on {}", link);
        }
        ChaptersEvent::EndChapter { current, total, .. } => {
            log::info!("chapter {}/{} done", current, total);
        }
        ChaptersEvent::Compressing { .. } => {
            log::info!("compressing range");
        }
        ChaptersEvent::Compressed { stats, .. } => {
            if stats.is_failure() {
                log::error!("archive failed");
            } else {
                log::info!("archived {} ({})", stats.path.display(), bytes_to_size(stats.size));
            }
        }
        ChaptersEvent::Done { manga, locations } => {
            log::info!("{}: {} chapters downloaded", manga, locations.len());
        }
    }
}

fn print_volume_event(event: VolumeEvent) {
    match event {
        VolumeEvent::Start { manga, volume } => {
            log::info!("{} volume {}", manga, volume);
        }
        VolumeEvent::Chapters { links } => {
            log::info!("{} chapters in volume", links.len());
        }
        VolumeEvent::StartChapter {
            attributes,
            pages,
            current,
            total,
        } => {
            log::info!(
                "chapter {} ({}/{}): {} pages",
                attributes.chapter,
                current,
                total,
                pages
            );
        }
        VolumeEvent::Page { attributes, total } => {
            log::info!("{} page {}/{}", attributes.chapter, attributes.page, total);
        }
        VolumeEvent::NoImage { link, .. } => {
            log::warn!("no image on {}", link);
        }
        VolumeEvent::EndChapter { current, total, .. } => {
            log::info!("chapter {}/{} done", current, total);
        }
        VolumeEvent::Compressing { .. } => {
            log::info!("compressing volume");
        }
        VolumeEvent::Compressed { stats, .. } => {
            if stats.is_failure() {
                log::error!("archive failed");
            } else {
                log::info!("archived {} ({})", stats.path.display(), bytes_to_size(stats.size));
            }
        }
        VolumeEvent::Done { manga, volume, .. } => {
            log::info!("{} volume {} done", manga, volume);
        }
    }
}

fn print_volumes_event(event: VolumesEvent) {
    match event {
        VolumesEvent::Start {
            manga, start, end, ..
        } => {
            log::info!("{}: volumes {} to {}", manga, start, end);
        }
        VolumesEvent::StartVolume {
            volume,
            index,
            total,
            ..
        } => {
            log::info!("volume {} ({}/{})", volume, index, total);
        }
        VolumesEvent::Chapters { volume, links, .. } => {
            log::info!("volume {}: {} chapters", volume, links.len());
        }
        VolumesEvent::StartChapter {
            attributes,
            pages,
            current,
            total,
        } => {
            log::info!(
                "chapter {} ({}/{}): {} pages",
                attributes.chapter,
                current,
                total,
                pages
            );
        }
        VolumesEvent::Page { attributes, total } => {
            log::info!("{} page {}/{}", attributes.chapter, attributes.page, total);
        }
        VolumesEvent::NoImage { link, .. } => {
            log::warn!("no image on {}", link);
        }
        VolumesEvent::EndChapter { current, total, .. } => {
            log::info!("chapter {}/{} done", current, total);
        }
        VolumesEvent::EndVolume { index, total, .. } => {
            log::info!("volume {}/{} done", index, total);
        }
        VolumesEvent::Done { manga, locations, .. } => {
            log::info!("{}: {} volumes downloaded", manga, locations.len());
        }
    }
}
