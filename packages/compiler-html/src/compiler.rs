use crate::render::render_block;
use mailforge_model::{Block, Context};

/// Options for HTML compilation
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOptions {
    /// Pretty print HTML
    pub pretty: bool,
    /// Indentation string
    pub indent: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            indent: "  ".to_string(),
        }
    }
}

struct Output {
    options: CompileOptions,
    depth: usize,
    buffer: String,
}

impl Output {
    fn new(options: CompileOptions) -> Self {
        Self {
            options,
            depth: 0,
            buffer: String::new(),
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn add_line(&mut self, text: &str) {
        if self.options.pretty {
            self.add_indent();
        }
        self.add(text);
        if self.options.pretty {
            self.add("\n");
        }
    }

    fn add_indent(&mut self) {
        for _ in 0..self.depth {
            self.buffer.push_str(&self.options.indent);
        }
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
        }
    }

    fn into_string(self) -> String {
        self.buffer
    }
}

/// Compile blocks to a complete HTML email using default options.
///
/// Absent or empty `blocks` yield an empty string, not an empty shell.
pub fn compile(blocks: Option<&[Block]>, context: &Context) -> String {
    compile_with_options(blocks, context, CompileOptions::default())
}

/// Compile blocks to a complete HTML email.
///
/// The shell is fixed; only the concatenated block fragments vary. Output
/// is deterministic for a given `(blocks, context, options)`.
pub fn compile_with_options(
    blocks: Option<&[Block]>,
    context: &Context,
    options: CompileOptions,
) -> String {
    let blocks = match blocks {
        Some(blocks) if !blocks.is_empty() => blocks,
        _ => return String::new(),
    };

    let mut out = Output::new(options);

    out.add_line("<!DOCTYPE html>");
    out.add_line("<html lang=\"en\">");
    out.indent();

    write_head(&mut out);

    out.add_line("<body style=\"margin: 0; padding: 20px; background-color: #f3f4f6;\">");
    out.indent();
    out.add_line(
        "<div style=\"max-width: 600px; margin: 0 auto; background-color: #ffffff; min-height: 100vh;\">",
    );
    out.indent();

    for block in blocks {
        let fragment = render_block(block, context);
        if !fragment.is_empty() {
            out.add_line(&fragment);
        }
    }

    out.dedent();
    out.add_line("</div>");
    out.dedent();
    out.add_line("</body>");

    out.dedent();
    out.add_line("</html>");

    out.into_string()
}

fn write_head(out: &mut Output) {
    out.add_line("<head>");
    out.indent();

    out.add_line("<meta charset=\"UTF-8\">");
    out.add_line("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">");
    out.add_line("<style>body { margin: 0; padding: 0; font-family: sans-serif; }</style>");

    out.dedent();
    out.add_line("</head>");
}
