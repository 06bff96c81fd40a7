use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::flow::loader::load_asset_from_path;
use crate::flow::types::FlowAsset;

/// Flow 资源注册表
#[derive(Default)]
pub struct FlowRegistry {
    assets: HashMap<String, Arc<FlowAsset>>,
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self {
            assets: HashMap::new(),
        }
    }

    pub fn register(&mut self, asset: FlowAsset) -> Arc<FlowAsset> {
        let asset = Arc::new(asset);
        self.assets
            .insert(asset.name().to_string(), Arc::clone(&asset));
        asset
    }

    pub fn get(&self, name: &str) -> Option<Arc<FlowAsset>> {
        self.assets.get(name).cloned()
    }

    pub fn list(&self) -> impl Iterator<Item = &Arc<FlowAsset>> {
        self.assets.values()
    }

    /// 加载目录下所有 `.json` 资源，返回成功加载的数量
    pub fn load_directory(&mut self, dir: &Path) -> Result<usize> {
        let mut loaded = 0;
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match load_asset_from_path(&path) {
                Ok(asset) => {
                    self.register(asset);
                    loaded += 1;
                }
                Err(err) => crate::log_error!(err, path = %path.display(), "skipping flow asset"),
            }
        }
        Ok(loaded)
    }
}
