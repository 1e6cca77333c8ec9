use std::path::Path;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no window available"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("window has no origin"))?;
    let base = reqwest::Url::parse(&format!("{}/", origin))?;
    Ok(base.join(file_name.trim_start_matches('/'))?)
}

/// Reads `file_name` relative to `root` natively, or relative to the page origin on the web.
pub async fn load_binary(root: &Path, file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let _ = root;
        let url = format_url(file_name)?;
        reqwest::get(url)
            .await?
            .error_for_status()?
            .bytes()
            .await?
            .to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = root.join(file_name.trim_start_matches('/'));
        tokio::fs::read(&path)
            .await
            .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?
    };

    Ok(data)
}

/// Resolves a uri found inside a scene file against the scene file's own location.
pub fn resolve_relative(scene_url: &str, uri: &str) -> String {
    match scene_url.rfind('/') {
        Some(idx) => format!("{}/{}", &scene_url[..idx], uri),
        None => uri.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_uris_resolve_next_to_the_scene() {
        assert_eq!(
            resolve_relative("/assets/models/car/1/scene.gltf", "scene.bin"),
            "/assets/models/car/1/scene.bin"
        );
        assert_eq!(resolve_relative("scene.gltf", "scene.bin"), "scene.bin");
    }
}
