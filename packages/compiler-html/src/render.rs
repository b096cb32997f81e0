use crate::interpolate::interpolate;
use crate::style::{escape_attr, Declarations};
use mailforge_model::{
    Block, BlockContent, ButtonData, Context, FooterData, HeaderData, ImageData, StyleMap,
    TextData,
};

const DEFAULT_SPACER_HEIGHT: &str = "20px";
const DEFAULT_ALT: &str = "Image";

/// Render one block to an HTML fragment.
///
/// Each variant emits its Style Map first and its own fixed rules after it
/// (see [`Declarations`]). Unknown block types render to an empty string.
pub fn render_block(block: &Block, context: &Context) -> String {
    let style = &block.style;
    match &block.content {
        BlockContent::Header(data) => render_header(data, style, context),
        BlockContent::Text(data) => render_text(data, style, context),
        BlockContent::Image(data) => render_image(data, style),
        BlockContent::Button(data) => render_button(data, style, context),
        BlockContent::Spacer => render_spacer(style),
        BlockContent::Footer(data) => render_footer(data, style, context),
        BlockContent::Unknown { .. } => String::new(),
    }
}

fn render_header(data: &HeaderData, style: &StyleMap, context: &Context) -> String {
    let color = style_text(style, "textColor").unwrap_or_else(|| "inherit".to_string());

    let outer = Declarations::from_style(style)
        .rule("font-family", "sans-serif")
        .rule("text-align", "center");
    let heading = Declarations::new()
        .rule("margin", "0")
        .rule("font-size", "28px")
        .rule("font-weight", "bold")
        .rule("color", color.clone());

    let mut html = format!(
        "<div style=\"{}\"><h1 style=\"{}\">{}</h1>",
        outer.to_attribute(),
        heading.to_attribute(),
        interpolate(&data.title, context)
    );

    if let Some(subtitle) = data.subtitle.as_deref().filter(|s| !s.is_empty()) {
        let sub = Declarations::new()
            .rule("margin", "8px 0 0 0")
            .rule("opacity", "0.9")
            .rule("color", color);
        html.push_str(&format!(
            "<p style=\"{}\">{}</p>",
            sub.to_attribute(),
            interpolate(subtitle, context)
        ));
    }

    html.push_str("</div>");
    html
}

fn render_text(data: &TextData, style: &StyleMap, context: &Context) -> String {
    let decls = Declarations::from_style(style)
        .rule("font-family", "sans-serif")
        .rule("line-height", "1.6");

    // Content is a restricted HTML subset and is passed through unescaped.
    format!(
        "<div style=\"{}\">{}</div>",
        decls.to_attribute(),
        interpolate(&data.content, context)
    )
}

fn render_image(data: &ImageData, style: &StyleMap) -> String {
    let alt = data
        .alt
        .as_deref()
        .filter(|a| !a.is_empty())
        .unwrap_or(DEFAULT_ALT);
    let wrapper = Declarations::new()
        .rule("text-align", "center")
        .rule("padding", "10px");
    let img = Declarations::from_style(style)
        .rule("max-width", "100%")
        .rule("display", "block")
        .rule("margin", "0 auto");

    format!(
        "<div style=\"{}\"><img src=\"{}\" alt=\"{}\" style=\"{}\" /></div>",
        wrapper.to_attribute(),
        escape_attr(&data.url),
        escape_attr(alt),
        img.to_attribute()
    )
}

fn render_button(data: &ButtonData, style: &StyleMap, context: &Context) -> String {
    let align = style_text(style, "align").unwrap_or_else(|| "center".to_string());
    let full_width = style.get("width").and_then(|w| w.as_str()) == Some("full");

    let wrapper = Declarations::new()
        .rule("padding", "20px")
        .rule("text-align", align);

    let mut anchor = Declarations::from_style(style);
    anchor = if full_width {
        anchor
            .rule("display", "block")
            .rule("width", "100%")
            .rule("box-sizing", "border-box")
    } else {
        anchor.rule("display", "inline-block")
    };
    let anchor = anchor
        .rule("text-decoration", "none")
        .rule("padding", "12px 24px")
        .rule("font-weight", "bold")
        .rule("font-family", "sans-serif");

    format!(
        "<div style=\"{}\"><a href=\"{}\" style=\"{}\">{}</a></div>",
        wrapper.to_attribute(),
        escape_attr(&data.url),
        anchor.to_attribute(),
        interpolate(&data.label, context)
    )
}

fn render_spacer(style: &StyleMap) -> String {
    let height = style_text(style, "height").unwrap_or_else(|| DEFAULT_SPACER_HEIGHT.to_string());
    let decls = Declarations::from_style(style).rule("height", height);
    format!("<div style=\"{}\"></div>", decls.to_attribute())
}

fn render_footer(data: &FooterData, style: &StyleMap, context: &Context) -> String {
    let decls = Declarations::from_style(style)
        .rule("font-family", "sans-serif")
        .rule("text-align", "center")
        .rule("font-size", "12px");
    format!(
        "<div style=\"{}\">{}</div>",
        decls.to_attribute(),
        interpolate(&data.text, context)
    )
}

/// Non-empty style value as text.
fn style_text(style: &StyleMap, key: &str) -> Option<String> {
    style
        .get(key)
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}
