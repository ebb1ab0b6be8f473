use crate::forms::UploadedImage;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt};
use tracing::info;
use uuid::Uuid;

/// Sub-directory of the media root that post images are written to.
pub const POST_IMAGES: &str = "posts";

/// Public URL for a stored media path.
pub fn media_url(relative: &str) -> String {
    format!("/media/{relative}")
}

/// Keeps the last path component and only portable characters.
fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}

fn with_suffix(name: &str) -> String {
    let suffix = &Uuid::new_v4().simple().to_string()[..7];
    match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_{suffix}.{ext}"),
        None => format!("{name}_{suffix}"),
    }
}

/// Writes the upload below `<media_root>/posts/` and returns the path relative
/// to the media root. An existing file with the same name is never replaced.
pub async fn save_post_image(media_root: &Path, image: &UploadedImage) -> io::Result<String> {
    let dir: PathBuf = media_root.join(POST_IMAGES);
    fs::create_dir_all(&dir).await?;

    let base = sanitize_file_name(&image.file_name);
    let mut name = base.clone();
    let mut file = loop {
        let opened = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dir.join(&name))
            .await;
        match opened {
            Ok(file) => break file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => name = with_suffix(&base),
            Err(e) => return Err(e),
        }
    };

    file.write_all(&image.bytes).await?;
    file.flush().await?;
    let relative = format!("{POST_IMAGES}/{name}");
    info!("Stored image {}", relative);
    Ok(relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    #[test]
    fn file_names_are_flattened() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\pics\\my cat.png"), "my_cat.png");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "image");
    }

    #[tokio::test]
    async fn collisions_get_a_suffix() {
        let root = tempfile::tempdir().unwrap();
        let image = UploadedImage {
            file_name: "small.gif".into(),
            content_type: None,
            bytes: Bytes::from_static(b"GIF89a"),
        };

        let first = save_post_image(root.path(), &image).await.unwrap();
        let second = save_post_image(root.path(), &image).await.unwrap();

        assert_eq!(first, "posts/small.gif");
        assert_ne!(first, second);
        assert!(second.starts_with("posts/small_") && second.ends_with(".gif"));
        assert!(root.path().join(&second).exists());
    }

    #[tokio::test]
    async fn concurrent_uploads_keep_both_files() {
        let root = tempfile::tempdir().unwrap();
        let upload = |bytes: &'static [u8]| UploadedImage {
            file_name: "small.gif".into(),
            content_type: None,
            bytes: Bytes::from_static(bytes),
        };
        let (first, second) = (upload(b"first"), upload(b"second"));

        let (a, b) = tokio::join!(
            save_post_image(root.path(), &first),
            save_post_image(root.path(), &second),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a, b);
        assert_eq!(std::fs::read(root.path().join(&a)).unwrap(), b"first");
        assert_eq!(std::fs::read(root.path().join(&b)).unwrap(), b"second");
    }
}
