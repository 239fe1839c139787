//! Nested catalog query: flatten a catalog of videos and pick each video's
//! smallest box art with a reduction.
//!
//! Run with: cargo run --example catalog

use coldstream::prelude::*;
use coldstream::utils;

#[derive(Clone, Debug)]
struct BoxArt {
    width: u32,
    height: u32,
    url: String,
}

#[derive(Clone, Debug)]
struct Video {
    id: u32,
    title: String,
    boxarts: Vec<BoxArt>,
}

#[derive(Clone, Debug)]
struct Catalog {
    videos: Vec<Video>,
}

fn art(width: u32, height: u32, url: &str) -> BoxArt {
    BoxArt {
        width,
        height,
        url: url.to_string(),
    }
}

fn sample() -> Vec<Catalog> {
    vec![
        Catalog {
            videos: vec![
                Video {
                    id: 70111470,
                    title: "Die Hard".to_string(),
                    boxarts: vec![
                        art(150, 200, "https://example.com/DieHard150.jpg"),
                        art(200, 200, "https://example.com/DieHard200.jpg"),
                    ],
                },
                Video {
                    id: 654356453,
                    title: "Bad Boys".to_string(),
                    boxarts: vec![
                        art(200, 200, "https://example.com/BadBoys200.jpg"),
                        art(140, 200, "https://example.com/BadBoys140.jpg"),
                    ],
                },
            ],
        },
        Catalog {
            videos: vec![Video {
                id: 65432445,
                title: "The Chamber".to_string(),
                boxarts: vec![art(130, 200, "https://example.com/TheChamber130.jpg")],
            }],
        },
    ]
}

#[tokio::main]
async fn main() -> coldstream::Result<()> {
    let summaries = from_iter(sample())
        .concat_map(|catalog| from_iter(catalog.videos))
        .concat_map(|video| {
            let id = video.id;
            let title = video.title.clone();
            from_iter(video.boxarts)
                .reduce(|best, art| {
                    if art.width * art.height < best.width * best.height {
                        art
                    } else {
                        best
                    }
                })
                .map(move |smallest| format!("{id} {title}: {url}", url = smallest.url))
        });

    for line in utils::collect(summaries).await? {
        println!("{line}");
    }
    Ok(())
}
