#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    use tempfile::TempDir;

    use crate::listing::{CacheListing, ListingSource, RegistryListing};
    use crate::scanner::{normalize_prefix, ContentCache, FilesystemObject, Registry, WebObject};

    #[test]
    fn prefixes_get_a_trailing_slash() {
        assert_eq!(normalize_prefix("/dl"), "/dl/");
        assert_eq!(normalize_prefix("/dl/"), "/dl/");
        assert_eq!(normalize_prefix("/"), "/");
    }

    #[test]
    fn web_path_replaces_disk_root() {
        let temp_dir = TempDir::new().unwrap();
        let disk_root = temp_dir.path().join("data/media");
        fs::create_dir_all(disk_root.join("x")).unwrap();
        let file = disk_root.join("x/y.mp4");
        fs::write(&file, "movie").unwrap();

        let node = FilesystemObject::from_path(&file, false).unwrap();
        let web = WebObject::new("/media/", &disk_root, node);
        assert_eq!(web.web_path, "/media/x/y.mp4");
    }

    #[test]
    fn web_path_ignores_trailing_slash_on_disk_root() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("x")).unwrap();
        fs::write(temp_dir.path().join("x/y.mp4"), "movie").unwrap();
        let with_slash = format!("{}/", temp_dir.path().display());

        let registry = Registry::new(Arc::new(ContentCache::new()));
        registry.register("/media/", &with_slash).unwrap();
        let files = registry.list_all_files().unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].web_path, "/media/x/y.mp4");
    }

    #[test]
    fn web_path_below_filesystem_root() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("clip.mp4");
        fs::write(&file, "frames").unwrap();

        let node = FilesystemObject::from_path(&file, false).unwrap();
        let web = WebObject::new("/all/", Path::new("/"), node);
        assert_eq!(web.web_path, format!("/all{}", file.display()));
    }

    #[test]
    fn register_fails_for_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let registry = Registry::new(Arc::new(ContentCache::new()));
        let err = registry.register("/dl/", temp_dir.path().join("missing")).unwrap_err();
        assert!(err.is_not_found());
        assert!(registry.roots().is_empty());
    }

    #[test]
    fn register_replaces_existing_prefix() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let registry = Registry::new(Arc::new(ContentCache::new()));
        registry.register("/dl", first.path()).unwrap();
        registry.register("/dl/", second.path()).unwrap();

        let roots = registry.roots();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].0, "/dl/");
        assert_eq!(roots[0].1.path, second.path());
        assert!(roots[0].1.root);
    }

    fn srv_files(base: &Path) {
        fs::create_dir_all(base.join("a/empty")).unwrap();
        fs::write(base.join("a/b.txt"), "0123456789").unwrap();
    }

    #[test]
    fn end_to_end_listing() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("srv/files");
        srv_files(&base);
        let registry = Registry::new(Arc::new(ContentCache::new()));
        registry.register("/dl/", &base).unwrap();

        let files = registry.list_all_files().unwrap();

        assert!(!base.join("a/empty").exists());
        assert!(base.join("a").exists());
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].web_path, "/dl/a/b.txt");
        assert_eq!(files[0].object.size, 10);
    }

    #[test]
    fn listing_spans_all_roots_and_skips_hidden() {
        let music = TempDir::new().unwrap();
        let video = TempDir::new().unwrap();
        fs::write(music.path().join("song.flac"), "la").unwrap();
        fs::write(music.path().join(".song.flac.part"), "l").unwrap();
        fs::write(video.path().join("clip.mp4"), "frames").unwrap();
        fs::write(video.path().join("clip.mp4~"), "old").unwrap();

        let registry = Registry::new(Arc::new(ContentCache::new()));
        registry.register("/music", music.path()).unwrap();
        registry.register("/video", video.path()).unwrap();

        let mut web: Vec<String> =
            registry.list_all_files().unwrap().into_iter().map(|w| w.web_path).collect();
        web.sort();
        assert_eq!(web, vec!["/music/song.flac".to_string(), "/video/clip.mp4".to_string()]);
    }

    #[test]
    fn listing_fails_when_a_root_vanishes() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("root");
        fs::create_dir(&root).unwrap();
        let registry = Registry::new(Arc::new(ContentCache::new()));
        registry.register("/dl/", &root).unwrap();
        fs::remove_dir(&root).unwrap();

        assert!(registry.list_all_files().is_err());
    }

    #[tokio::test]
    async fn registry_listing_serializes_web_paths() {
        let temp_dir = TempDir::new().unwrap();
        srv_files(temp_dir.path());
        let cache = Arc::new(ContentCache::new());
        let registry = Arc::new(Registry::new(cache.clone()));
        registry.register("/dl/", temp_dir.path()).unwrap();

        let listing = RegistryListing::new(registry).list().await.unwrap();
        let json = serde_json::to_value(&listing).unwrap();

        let item = &json.as_array().unwrap()[0];
        assert_eq!(item["web_path"], "/dl/a/b.txt");
        assert_eq!(item["size"], 10);
        assert_eq!(item["is_dir"], false);
        assert_eq!(item["hash"].as_str().unwrap().len(), 64);
        assert!(item.get("mode").is_none());
        // The rescan also warmed the cache.
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn cache_listing_has_no_web_paths() {
        let temp_dir = TempDir::new().unwrap();
        srv_files(temp_dir.path());
        fs::write(temp_dir.path().join(".hidden"), "h").unwrap();
        let cache = Arc::new(ContentCache::new());
        let root = FilesystemObject::from_path(temp_dir.path(), true).unwrap();
        root.clean(&cache).unwrap();
        cache.sync_tree(&root);
        assert_eq!(cache.len(), 2);

        let listing = CacheListing::new(cache).list().await.unwrap();
        assert_eq!(listing.len(), 1);
        let json = serde_json::to_value(&listing).unwrap();
        let item = &json.as_array().unwrap()[0];
        assert!(item.get("web_path").is_none());
        assert!(item["path"].as_str().unwrap().ends_with("b.txt"));
        assert_eq!(item["content_type"], "text/plain");
    }
}
