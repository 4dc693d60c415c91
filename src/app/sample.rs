//! Offline demo data used when no delivery credentials are configured.

use serde_json::{Value, json};

use crate::binder::DevHost;

pub const DEMO_API_KEY: &str = "demo";

pub fn demo_config() -> Value {
    json!({
        "api_key": DEMO_API_KEY,
        "delivery_token": "demo",
        "environment": "development",
        "content_type": "blog_article",
        "content_type_columns": [
            {"id": "title", "name": "Title"},
            {"id": "author.name", "name": "Author"},
            {"id": "sort_date", "name": "Date"}
        ]
    })
}

pub fn demo_host() -> DevHost {
    DevHost::new(demo_config(), json!({}))
}

pub fn demo_entries() -> Vec<Value> {
    const TOPICS: [(&str, &str); 12] = [
        ("Why Do Cats Like High Places?", "Ada Byron"),
        ("A Field Guide to Sourdough", "Grace Hopper"),
        ("Cats, Boxes and Quantum Physics", "Ada Byron"),
        ("Ten Years of Terminal UIs", "Ken Thompson"),
        ("Understanding Borrow Checking", "Niko M."),
        ("The Quiet Joy of Houseplants", "Grace Hopper"),
        ("How Maps Lie", "Mark M."),
        ("Bicycles in the Rain", "Ken Thompson"),
        ("Notes on Typesetting", "Don K."),
        ("Cooking for One", "Niko M."),
        ("What Owls Know", "Mark M."),
        ("Cats Who Code", "Don K."),
    ];
    (0..36)
        .map(|index| {
            let (title, author) = TOPICS[index % TOPICS.len()];
            let edition = index / TOPICS.len();
            let title = if edition == 0 {
                title.to_string()
            } else {
                format!("{title} (part {})", edition + 1)
            };
            json!({
                "uid": format!("blt{:016x}", 0x5eed_0000_u64 + index as u64),
                "title": title,
                "author": {"name": author},
                "sort_date": format!("2023-{:02}-{:02}", 1 + index % 12, 1 + (index * 7) % 28),
            })
        })
        .collect()
}
