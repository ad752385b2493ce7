//! Game-shaped fixtures shared by the inspect and agent test suites.
//!
//! [`TestGame`] models the interesting corners of a real runtime graph: a
//! numeric and a textual field for coercion, a nested scene stack for path
//! navigation, a back-reference cycle, an opaque renderer handle and a
//! bulky asset store for identity exclusion.

use crate::{DynValue, Field, Inspect, InvokeError};

pub struct TestGame {
    pub score: f64,
    pub title: String,
    pub running: bool,
    pub scene_stack: SceneStack,
    pub assets: AssetStore,
}

impl TestGame {
    pub fn new() -> Self {
        Self {
            score: 10.0,
            title: "space shooter".to_string(),
            running: true,
            scene_stack: SceneStack::new("level 1"),
            assets: AssetStore {
                textures: vec!["hero.png".to_string(), "tiles.png".to_string()],
            },
        }
    }

    /// Run-state hook: what a real engine wires to its main loop.
    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }
}

impl Default for TestGame {
    fn default() -> Self {
        Self::new()
    }
}

impl Inspect for TestGame {
    fn field_names(&self) -> Vec<String> {
        ["score", "title", "running", "sceneStack", "assets", "renderer"]
            .map(String::from)
            .to_vec()
    }

    fn field(&self, name: &str) -> Option<Field<'_>> {
        match name {
            "score" => Some(Field::Scalar(DynValue::Number(self.score))),
            "title" => Some(Field::Scalar(DynValue::Text(self.title.clone()))),
            "running" => Some(Field::Scalar(DynValue::Bool(self.running))),
            "sceneStack" => Some(Field::Object(&self.scene_stack)),
            "assets" => Some(Field::Object(&self.assets)),
            "renderer" => Some(Field::Opaque),
            _ => None,
        }
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut dyn Inspect> {
        match name {
            "sceneStack" => Some(&mut self.scene_stack),
            "assets" => Some(&mut self.assets),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: DynValue) -> bool {
        match (name, value) {
            ("score", DynValue::Number(n)) => {
                self.score = n;
                true
            }
            ("title", DynValue::Text(s)) => {
                self.title = s;
                true
            }
            ("running", DynValue::Bool(b)) => {
                self.running = b;
                true
            }
            _ => false,
        }
    }

    fn invoke(&mut self, name: &str, args: &[serde_json::Value]) -> Result<(), InvokeError> {
        match name {
            "reset" => {
                self.score = 0.0;
                Ok(())
            }
            "addScore" => {
                let amount = args
                    .first()
                    .and_then(|v| v.as_f64())
                    .ok_or_else(|| InvokeError::Failed {
                        name: name.to_string(),
                        reason: "missing numeric argument".to_string(),
                    })?;
                self.score += amount;
                Ok(())
            }
            other => Err(InvokeError::UnknownMember {
                name: other.to_string(),
            }),
        }
    }
}

pub struct SceneStack {
    pub scene: Scene,
}

impl SceneStack {
    pub fn new(scene_name: &str) -> Self {
        Self {
            scene: Scene {
                name: scene_name.to_string(),
                time_scale: 1.0,
            },
        }
    }
}

impl Inspect for SceneStack {
    fn field_names(&self) -> Vec<String> {
        vec!["scene".to_string()]
    }

    fn field(&self, name: &str) -> Option<Field<'_>> {
        match name {
            "scene" => Some(Field::Object(&self.scene)),
            _ => None,
        }
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut dyn Inspect> {
        match name {
            "scene" => Some(&mut self.scene),
            _ => None,
        }
    }
}

pub struct Scene {
    pub name: String,
    pub time_scale: f64,
}

impl Inspect for Scene {
    fn field_names(&self) -> Vec<String> {
        ["name", "timeScale", "parent"].map(String::from).to_vec()
    }

    fn field(&self, name: &str) -> Option<Field<'_>> {
        match name {
            "name" => Some(Field::Scalar(DynValue::Text(self.name.clone()))),
            "timeScale" => Some(Field::Scalar(DynValue::Number(self.time_scale))),
            // Stands in for the engine's back-reference to an ancestor.
            "parent" => Some(Field::Object(self)),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: DynValue) -> bool {
        match (name, value) {
            ("name", DynValue::Text(s)) => {
                self.name = s;
                true
            }
            ("timeScale", DynValue::Number(n)) => {
                self.time_scale = n;
                true
            }
            _ => false,
        }
    }
}

pub struct AssetStore {
    pub textures: Vec<String>,
}

impl Inspect for AssetStore {
    fn field_names(&self) -> Vec<String> {
        ["textureCount", "textures"].map(String::from).to_vec()
    }

    fn field(&self, name: &str) -> Option<Field<'_>> {
        match name {
            "textureCount" => Some(Field::Scalar(DynValue::Number(self.textures.len() as f64))),
            "textures" => Some(Field::Scalar(DynValue::Text(self.textures.join(", ")))),
            _ => None,
        }
    }
}

/// A singly-linked chain for depth-limit tests.
pub struct Chain {
    pub value: f64,
    pub next: Option<Box<Chain>>,
}

impl Inspect for Chain {
    fn field_names(&self) -> Vec<String> {
        let mut names = vec!["value".to_string()];
        if self.next.is_some() {
            names.push("next".to_string());
        }
        names
    }

    fn field(&self, name: &str) -> Option<Field<'_>> {
        match name {
            "value" => Some(Field::Scalar(DynValue::Number(self.value))),
            "next" => self
                .next
                .as_deref()
                .map(|next| Field::Object(next as &dyn Inspect)),
            _ => None,
        }
    }
}

/// Build a chain with `links` nodes below the head.
pub fn chain(links: usize) -> Chain {
    let mut next = None;
    for depth in (1..=links).rev() {
        next = Some(Box::new(Chain {
            value: depth as f64,
            next,
        }));
    }
    Chain { value: 0.0, next }
}
