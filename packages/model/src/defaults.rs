//! Starter content: palette defaults for each block kind, the block set a
//! new template starts with, and the sample personalization context.

use crate::{
    Block, BlockContent, BlockKind, ButtonData, Context, FooterData, HeaderData, ImageData,
    Scalar, TextData,
};

pub const UNTITLED_NAME: &str = "Untitled Template";
pub const DEFAULT_CATEGORY: &str = "Other";
pub const DEFAULT_SUBJECT: &str = "New Subject";

/// The block the palette inserts for `kind`.
pub fn default_block(kind: BlockKind, id: impl Into<String>) -> Block {
    let id = id.into();
    match kind {
        BlockKind::Header => Block::new(
            id,
            BlockContent::Header(HeaderData {
                title: "New Header".to_string(),
                subtitle: Some("Subtitle goes here".to_string()),
            }),
        )
        .with_style("backgroundColor", "#ffffff")
        .with_style("textColor", "#000000")
        .with_style("padding", "20px"),

        BlockKind::Text => Block::new(
            id,
            BlockContent::Text(TextData {
                content: "Edit this text block...".to_string(),
            }),
        )
        .with_style("padding", "10px")
        .with_style("color", "#333333")
        .with_style("fontSize", "16px"),

        BlockKind::Image => Block::new(
            id,
            BlockContent::Image(ImageData {
                url: "https://placehold.co/600x200".to_string(),
                alt: Some("Placeholder".to_string()),
            }),
        )
        .with_style("width", "100%")
        .with_style("borderRadius", "0px"),

        BlockKind::Button => Block::new(
            id,
            BlockContent::Button(ButtonData {
                label: "Click Me".to_string(),
                url: "#".to_string(),
            }),
        )
        .with_style("backgroundColor", "#000000")
        .with_style("color", "#ffffff")
        .with_style("borderRadius", "4px")
        .with_style("align", "center"),

        BlockKind::Spacer => Block::new(id, BlockContent::Spacer).with_style("height", "30px"),

        BlockKind::Footer => Block::new(
            id,
            BlockContent::Footer(FooterData {
                text: "© {{year}} Company Name".to_string(),
            }),
        )
        .with_style("backgroundColor", "#f3f4f6")
        .with_style("color", "#9ca3af")
        .with_style("padding", "20px"),
    }
}

/// Blocks of a freshly created template.
pub fn default_blocks() -> Vec<Block> {
    vec![
        Block::new(
            "s1",
            BlockContent::Header(HeaderData {
                title: "Welcome Aboard!".to_string(),
                subtitle: Some("We are glad you are here.".to_string()),
            }),
        )
        .with_style("backgroundColor", "#4f46e5")
        .with_style("textColor", "#ffffff")
        .with_style("padding", "32px"),
        Block::new(
            "s2",
            BlockContent::Text(TextData {
                content: "Hi {{name}},<br><br>We are thrilled to have you join \
                          <strong>{{company}}</strong>. This is a default text block you can edit."
                    .to_string(),
            }),
        )
        .with_style("padding", "24px")
        .with_style("textAlign", "left")
        .with_style("fontSize", "16px")
        .with_style("color", "#374151"),
        Block::new(
            "s3",
            BlockContent::Button(ButtonData {
                label: "Get Started".to_string(),
                url: "#".to_string(),
            }),
        )
        .with_style("backgroundColor", "#4f46e5")
        .with_style("color", "#ffffff")
        .with_style("borderRadius", "8px")
        .with_style("width", "auto")
        .with_style("align", "center"),
        Block::new(
            "s4",
            BlockContent::Footer(FooterData {
                text: "© {{year}} {{company}}. All rights reserved.".to_string(),
            }),
        )
        .with_style("backgroundColor", "#f3f4f6")
        .with_style("color", "#9ca3af")
        .with_style("padding", "16px"),
    ]
}

/// Mock recipient used for previews and for sends without explicit context.
pub fn sample_context(year: i32) -> Context {
    let mut context = Context::new();
    context.insert("name".to_string(), Scalar::from("Valued Customer"));
    context.insert("company".to_string(), Scalar::from("Your Company"));
    context.insert("role".to_string(), Scalar::from("Developer"));
    context.insert("year".to_string(), Scalar::from(year));
    context
}
