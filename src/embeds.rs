use crate::config::EditorConfig;
use crate::document::{BlockId, Document, Embed, EmbedKind};
use crate::remote::{Client, OembedResponse};
use crate::types::Action;
use color_eyre::Result;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time;

/// Delay before a committed social embed asks for a re-render, matching the
/// grace period the original gave external widget scripts to load.
const WIDGET_REFRESH_DELAY: Duration = Duration::from_secs(2);

static RE_PROVIDER_SCREEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("youtube|youtu\\.be|vimeo|twitter|facebook|instagram").expect("invalid regex")
});

/// One pattern per provider, tried in order; the first structural match wins
/// and its captures are substituted into the markup template.
static PROVIDERS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"^((http(s)?://)?(www\.)?(youtube\.com|youtu\.be)/(watch\?v=|v/)?)([a-zA-Z0-9\-_]+)(.*)?$")
                .expect("invalid regex"),
            r#"<div class="video"><iframe width="420" height="315" src="//www.youtube.com/embed/${7}" frameborder="0" allowfullscreen></iframe></div>"#,
        ),
        (
            Regex::new(r"^http://vimeo\.com(/.+)?/([0-9]+)$").expect("invalid regex"),
            r#"<iframe src="//player.vimeo.com/video/${2}" width="500" height="281" frameborder="0" webkitallowfullscreen mozallowfullscreen allowfullscreen></iframe>"#,
        ),
        (
            Regex::new(r"^https://twitter\.com/(\w+)/status/(\d+)/?$").expect("invalid regex"),
            r#"<blockquote class="twitter-tweet" align="center" lang="en"><a href="https://twitter.com/${1}/statuses/${2}"></a></blockquote><script async src="//platform.twitter.com/widgets.js" charset="utf-8"></script>"#,
        ),
        (
            Regex::new(r"^https://www\.facebook\.com/(video.php|photo.php)\?v=(\d+).+$")
                .expect("invalid regex"),
            r#"<div class="fb-post" data-href="https://www.facebook.com/photo.php?v=${2}"><div class="fb-xfbml-parse-ignore"><a href="https://www.facebook.com/photo.php?v=${2}">Post</a></div></div>"#,
        ),
        (
            Regex::new(r"^http://instagram\.com/p/(.+)/?$").expect("invalid regex"),
            r#"<span class="instagram"><iframe src="//instagram.com/p/${1}/embed/" width="612" height="710" frameborder="0" scrolling="no" allowtransparency="true"></iframe></span>"#,
        ),
    ]
});

static RE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<("[^"]*"|'[^']*'|[^'">])*>"#).expect("invalid regex")
});

/// Resolves a URL against the provider table without any network access.
/// Yields nothing for unknown providers or when substitution produced no
/// well-formed markup.
pub fn resolve_local(url: &str) -> Option<Embed> {
    let url = url.replace('\n', "");
    if !RE_PROVIDER_SCREEN.is_match(&url) {
        return None;
    }
    let markup = PROVIDERS.iter().find_map(|(re, template)| {
        re.is_match(&url)
            .then(|| re.replace(&url, *template).into_owned())
    })?;
    RE_TAG.is_match(&markup).then_some(Embed {
        html: markup,
        kind: EmbedKind::Rich,
        url,
    })
}

/// Maps a proxy response to an embed: rich markup wins, a typed photo with a
/// direct image URL is synthesized into a plain image tag.
fn from_oembed(url: &str, response: OembedResponse) -> Option<Embed> {
    if let Some(html) = response.html.filter(|html| !html.is_empty()) {
        return Some(Embed {
            html,
            kind: EmbedKind::Rich,
            url: url.to_string(),
        });
    }
    if response.kind.as_deref() == Some("photo") {
        if let Some(image_url) = response.url {
            return Some(Embed {
                html: format!(r#"<img src="{image_url}" />"#),
                kind: EmbedKind::Photo,
                url: url.to_string(),
            });
        }
    }
    None
}

/// Owns the pending-embed lifecycle: Enter/Backspace handling on the active
/// slot, resolution through one of the two strategies, and the commit into
/// the document.
pub struct EmbedsController {
    action_tx: UnboundedSender<Action>,
    client: Arc<Client>,
    config: EditorConfig,
}

impl EmbedsController {
    pub fn new(
        action_tx: UnboundedSender<Action>,
        client: Arc<Client>,
        config: EditorConfig,
    ) -> Self {
        Self {
            action_tx,
            client,
            config,
        }
    }

    /// Enter on the active slot: an empty slot is abandoned, a slot with text
    /// starts resolution (the line break is suppressed either way).
    pub fn process_enter(&self, doc: &mut Document) -> Result<()> {
        let Some(slot) = doc.current_slot_mut() else {
            return Ok(());
        };
        if slot.text.trim().is_empty() {
            doc.abandon_slot();
            return Ok(());
        }
        let Some((slot, url)) = doc.begin_resolve() else {
            return Ok(());
        };
        match self.config.oembed_proxy.clone().filter(|p| !p.is_empty()) {
            Some(proxy) => {
                let tx = self.action_tx.clone();
                let client = Arc::clone(&self.client);
                self.client.spawn(async move {
                    let embed = match client.oembed(&proxy, &url).await {
                        Ok(response) => from_oembed(&url, response),
                        Err(e) => {
                            log::warn!("oembed lookup for {url} failed: {e}");
                            None
                        }
                    };
                    if let Err(e) = tx.send(Action::EmbedResolved { slot, embed }) {
                        log::error!("failed to send resolution result: {e}");
                    }
                });
            }
            None => {
                self.action_tx.send(Action::EmbedResolved {
                    slot,
                    embed: resolve_local(&url),
                })?;
            }
        }
        Ok(())
    }

    /// Resolution finished. Success commits the embed into the slot that
    /// started the lookup and emits a content change; failure alerts and
    /// leaves that slot's text for correction.
    pub fn finish(
        &self,
        doc: &mut Document,
        slot: BlockId,
        embed: Option<Embed>,
    ) -> Result<Option<Action>> {
        let Some(embed) = embed else {
            doc.fail_resolve(slot);
            self.action_tx
                .send(Action::Alert(self.config.messages.resolve_error.clone()))?;
            return Ok(Some(Action::Render));
        };
        let needs_widget_refresh = embed.html.contains("facebook");
        if !doc.commit_embed(slot, embed) {
            return Ok(None);
        }
        if needs_widget_refresh {
            let tx = self.action_tx.clone();
            self.client.spawn(async move {
                time::sleep(WIDGET_REFRESH_DELAY).await;
                tx.send(Action::RefreshEmbeds).ok();
            });
        }
        Ok(Some(Action::ContentChanged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn youtube_iframe_carries_the_video_id() {
        let embed =
            resolve_local("https://www.youtube.com/watch?v=BROWqjuTM0g").expect("resolved");
        assert!(embed
            .html
            .contains(r#"src="//www.youtube.com/embed/BROWqjuTM0g""#));
        assert_eq!(embed.kind, EmbedKind::Rich);
    }

    #[test]
    fn short_youtube_url_resolves() {
        let embed = resolve_local("https://youtu.be/BROWqjuTM0g").expect("resolved");
        assert!(embed.html.contains("//www.youtube.com/embed/BROWqjuTM0g"));
    }

    #[test]
    fn vimeo_resolves_to_player_iframe() {
        let embed = resolve_local("http://vimeo.com/76979871").expect("resolved");
        assert!(embed.html.contains("//player.vimeo.com/video/76979871"));
    }

    #[test]
    fn twitter_status_resolves_to_blockquote() {
        let embed =
            resolve_local("https://twitter.com/medium_editor/status/694987296379682816")
                .expect("resolved");
        assert!(embed.html.contains("twitter-tweet"));
        assert!(embed
            .html
            .contains("https://twitter.com/medium_editor/statuses/694987296379682816"));
    }

    #[test]
    fn facebook_video_resolves_to_post_markup() {
        let embed = resolve_local("https://www.facebook.com/video.php?v=690752270990768&set=x")
            .expect("resolved");
        assert!(embed.html.contains("fb-post"));
        assert!(embed
            .html
            .contains("https://www.facebook.com/photo.php?v=690752270990768"));
    }

    #[test]
    fn instagram_resolves_to_embed_iframe() {
        let embed = resolve_local("http://instagram.com/p/tkQrCGJsTj/").expect("resolved");
        assert!(embed.html.contains("//instagram.com/p/tkQrCGJsTj/"));
    }

    #[test]
    fn unknown_provider_yields_no_result() {
        assert_eq!(resolve_local("https://example.com/watch?v=123"), None);
        assert_eq!(resolve_local("not a url at all"), None);
    }

    #[test]
    fn known_provider_with_unmatched_shape_yields_no_result() {
        // passes the provider screen but matches no structural pattern
        assert_eq!(resolve_local("https://vimeo.com/about"), None);
        assert_eq!(resolve_local("https://twitter.com/medium_editor"), None);
    }

    #[test]
    fn newlines_are_stripped_before_matching() {
        let embed = resolve_local("http://vimeo.com/76979871\n").expect("resolved");
        assert!(embed.html.contains("76979871"));
    }

    #[test]
    fn oembed_rich_markup_wins() {
        let embed = from_oembed(
            "https://example.com/a",
            OembedResponse {
                html: Some("<iframe></iframe>".into()),
                kind: Some("video".into()),
                url: None,
            },
        )
        .expect("embed");
        assert_eq!(embed.kind, EmbedKind::Rich);
        assert_eq!(embed.html, "<iframe></iframe>");
    }

    #[test]
    fn oembed_photo_synthesizes_image_tag() {
        let embed = from_oembed(
            "https://example.com/a",
            OembedResponse {
                html: None,
                kind: Some("photo".into()),
                url: Some("https://images.example.com/a.jpg".into()),
            },
        )
        .expect("embed");
        assert_eq!(embed.kind, EmbedKind::Photo);
        assert_eq!(embed.html, r#"<img src="https://images.example.com/a.jpg" />"#);
    }

    #[test]
    fn oembed_without_markup_or_photo_yields_no_result() {
        assert!(from_oembed(
            "https://example.com/a",
            OembedResponse {
                html: None,
                kind: Some("link".into()),
                url: Some("https://example.com/a".into()),
            },
        )
        .is_none());
        assert!(from_oembed("https://example.com/a", OembedResponse::default()).is_none());
    }
}
