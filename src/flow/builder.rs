use std::collections::HashSet;

use serde_json::Value;

use crate::error::{FlowError, Result};
use crate::flow::conditions::Condition;
use crate::flow::types::{ActionDescriptor, ActionId, FlowAsset, FlowLink};
use crate::state::{VarValue, VariableStore};
use crate::utils::validation::ConfigValidator;

/// FlowAsset 构建器
///
/// 连接可以在目标动作声明之前添加，`build` 时统一校验。
#[derive(Clone, Debug)]
pub struct FlowAssetBuilder {
    name: String,
    start: Option<ActionId>,
    actions: Vec<ActionDescriptor>,
    links: Vec<(ActionId, FlowLink)>,
    variables: VariableStore,
}

impl FlowAssetBuilder {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self {
            name: name.into(),
            start: None,
            actions: Vec::new(),
            links: Vec::new(),
            variables: VariableStore::new(),
        }
    }

    pub fn add_action(&mut self, id: &str, type_name: &str) -> &mut Self {
        self.actions.push(ActionDescriptor::new(id, type_name));
        self
    }

    pub fn add_action_with_params(&mut self, id: &str, type_name: &str, params: Value) -> &mut Self {
        self.actions
            .push(ActionDescriptor::new(id, type_name).with_params(params));
        self
    }

    pub fn set_start(&mut self, id: &str) -> &mut Self {
        self.start = Some(id.to_string());
        self
    }

    pub fn set_variable(&mut self, name: &str, value: impl Into<VarValue>) -> &mut Self {
        self.variables.set(name, value);
        self
    }

    pub fn add_link(&mut self, from: &str, link: FlowLink) -> &mut Self {
        self.links.push((from.to_string(), link));
        self
    }

    pub fn link(&mut self, from: &str, to: &str) -> &mut Self {
        self.add_link(from, FlowLink::new(to))
    }

    pub fn link_if(&mut self, from: &str, to: &str, condition: Condition) -> &mut Self {
        self.add_link(from, FlowLink::new(to).with_condition(condition))
    }

    pub fn link_yield(&mut self, from: &str, to: &str) -> &mut Self {
        self.add_link(from, FlowLink::new(to).yielding())
    }

    pub fn build(&self) -> Result<FlowAsset> {
        ConfigValidator::validate_flow_name(&self.name)?;

        let mut ids = HashSet::with_capacity(self.actions.len());
        for action in &self.actions {
            ConfigValidator::validate_action_id(&action.id)?;
            if action.type_name.trim().is_empty() {
                return Err(FlowError::Asset(format!(
                    "action `{}` has no type",
                    action.id
                )));
            }
            if !ids.insert(action.id.as_str()) {
                return Err(FlowError::DuplicateAction(action.id.clone()));
            }
        }
        for name in self.variables.iter().map(|(name, _)| name) {
            ConfigValidator::validate_variable_name(name)?;
        }

        let mut actions = self.actions.clone();
        for (from, link) in &self.links {
            if !ids.contains(link.to.as_str()) {
                return Err(FlowError::UnknownAction(link.to.clone()));
            }
            let source = actions
                .iter_mut()
                .find(|action| &action.id == from)
                .ok_or_else(|| FlowError::UnknownAction(from.clone()))?;
            source.links.push(link.clone());
        }

        if let Some(start) = &self.start {
            if !ids.contains(start.as_str()) {
                return Err(FlowError::UnknownAction(start.clone()));
            }
        }

        FlowAsset::from_parts(
            self.name.clone(),
            actions,
            self.start.clone(),
            self.variables.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_keep_declaration_order() {
        let mut builder = FlowAssetBuilder::new("order");
        builder
            .link("gate", "left")
            .link_yield("gate", "right")
            .add_action("gate", "branch")
            .add_action("left", "end")
            .add_action("right", "end")
            .set_start("gate");
        let asset = builder.build().unwrap();

        let gate = asset.find_action("gate").unwrap();
        let targets: Vec<_> = gate.links.iter().map(|l| l.to.as_str()).collect();
        assert_eq!(targets, vec!["left", "right"]);
        assert!(!gate.links[0].yield_frame);
        assert!(gate.links[1].yield_frame);
        assert_eq!(asset.default_start_action_id(), Some("gate"));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let mut builder = FlowAssetBuilder::new("dup");
        builder.add_action("a", "end").add_action("a", "end");
        assert!(matches!(builder.build(), Err(FlowError::DuplicateAction(id)) if id == "a"));
    }

    #[test]
    fn test_rejects_dangling_links() {
        let mut builder = FlowAssetBuilder::new("dangling");
        builder.add_action("a", "branch").link("a", "missing");
        assert!(matches!(builder.build(), Err(FlowError::UnknownAction(id)) if id == "missing"));
    }

    #[test]
    fn test_rejects_unknown_start() {
        let mut builder = FlowAssetBuilder::new("start");
        builder.add_action("a", "end").set_start("b");
        assert!(builder.build().is_err());
    }
}
