//! Self-contained HTML rendering for the comment block.
//!
//! Markup and styling mirror the upstream reading view closely enough that
//! the appended block blends into the archived page: avatar on the left,
//! name and like count on the meta line, author replies indented with a
//! green bar. Everything is inline - the archived document must not depend
//! on external assets.

use html_escape::encode_text;

use crate::fetch::CommentEntry;

const COMMENT_STYLE: &str = r#"<div><style>
    .comment_block {
        position: relative;
        margin-bottom: 25px;
        font-size: 0.9em;
    }
    .logo_block {
        position: absolute;
        left: 0;
        width: 40px;
        padding-right: 5px;
        box-sizing: border-box;
    }
    .logo_block img {
        width: 100%;
    }
    .comment_meta {
        position: relative;
        margin-left: 40px;
        color: #999;
        font-size: 0.9em;
        height: 1.2em;
        line-height: 1em;
    }
    .comment_meta span {
        display: inline-block;
        position: absolute;
    }
    .comment_content {
        margin-left: 40px;
        margin-bottom: 5px;
        clear: both;
        line-height: 1.5em;
    }
</style></div>"#;

/// Renders featured comments into one self-contained markup block.
///
/// Returns an empty string when there are no comments - the pipeline
/// appends nothing in that case.
#[must_use]
pub fn render_comment_block(comments: &[CommentEntry]) -> String {
    if comments.is_empty() {
        return String::new();
    }

    let mut out = String::from("<div class=\"comment_area\">");
    out.push_str(COMMENT_STYLE);
    for comment in comments {
        render_comment(&mut out, comment);
    }
    out.push_str("</div>");
    out
}

fn render_comment(out: &mut String, comment: &CommentEntry) {
    let author = encode_text(&comment.author);
    let text = encode_text(&comment.text);

    out.push_str("<div class=\"comment_block\">");
    out.push_str(&format!(
        "<div class=\"logo_block\"><img src=\"{}\"/></div>",
        comment.avatar_url
    ));
    out.push_str(&format!(
        "<div class=\"comment_meta\">\
         <span style=\"left: 0\">{author}</span>\
         <span style=\"right: 0\">👍 {}</span>\
         </div>",
        comment.likes
    ));
    out.push_str(&format!("<div class=\"comment_content\">{text}</div>"));

    if let Some(reply) = &comment.reply {
        let reply_text = encode_text(&reply.text);
        out.push_str(&format!(
            "<div class=\"comment_meta\" style=\"border-left: solid 3px #1AAD19;\">\
             <span style=\"left: 0; padding-left: 5px;\">作者</span>\
             <span style=\"right: 0\">👍 {}</span>\
             </div>",
            reply.likes
        ));
        out.push_str(&format!("<div class=\"comment_content\">{reply_text}</div>"));
    }
    out.push_str("</div>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::CommentReply;

    fn comment(author: &str, text: &str) -> CommentEntry {
        CommentEntry {
            author: author.to_string(),
            avatar_url: "http://img/avatar.png".to_string(),
            text: text.to_string(),
            created_at: 1_614_592_900,
            likes: 5,
            reply: None,
        }
    }

    #[test]
    fn test_render_empty_is_empty() {
        assert_eq!(render_comment_block(&[]), "");
    }

    #[test]
    fn test_render_single_comment() {
        let block = render_comment_block(&[comment("reader", "great article")]);
        assert!(block.contains("comment_block"));
        assert!(block.contains("reader"));
        assert!(block.contains("great article"));
        assert!(block.contains("http://img/avatar.png"));
        assert!(block.contains("👍 5"));
        // Style ships inside the block - no external assets.
        assert!(block.contains("<style>"));
    }

    #[test]
    fn test_render_reply_styled_distinctly() {
        let mut with_reply = comment("reader", "question?");
        with_reply.reply = Some(CommentReply {
            text: "answer".to_string(),
            likes: 2,
        });
        let block = render_comment_block(&[with_reply]);
        assert!(block.contains("作者"));
        assert!(block.contains("answer"));
        assert!(block.contains("#1AAD19"));
    }

    #[test]
    fn test_render_escapes_markup_in_text() {
        let block = render_comment_block(&[comment("<b>x</b>", "a <script> tag")]);
        assert!(!block.contains("<b>x</b>"));
        assert!(!block.contains("<script>"));
        assert!(block.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_render_preserves_order() {
        let block = render_comment_block(&[comment("first", "1"), comment("second", "2")]);
        let first = block.find("first").unwrap_or(usize::MAX);
        let second = block.find("second").unwrap_or(usize::MAX);
        assert!(first < second);
    }
}
