/// Output filename template with `[name]`, `[id]`, `[hash]` and (for
/// source-map sidecars) `[file]` placeholder substitution.
#[derive(Debug, Clone)]
pub struct FilenameTemplate(String);

impl FilenameTemplate {
  pub fn new(template: String) -> Self {
    Self(template)
  }

  pub fn template(&self) -> &str {
    &self.0
  }

  pub fn has_hash_pattern(&self) -> bool {
    self.0.contains("[hash]")
  }

  pub fn render(&self, name: Option<&str>, id: Option<u32>, hash: Option<&str>) -> String {
    let mut ret = self.0.clone();
    if let Some(name) = name {
      ret = ret.replace("[name]", name);
    }
    if let Some(id) = id {
      ret = ret.replace("[id]", &id.to_string());
    }
    if let Some(hash) = hash {
      ret = ret.replace("[hash]", hash);
    }
    ret
  }

  pub fn render_sidecar(&self, file: &str) -> String {
    self.0.replace("[file]", file)
  }
}

#[test]
fn test_render() {
  let template = FilenameTemplate::new("[name].[id].[hash].js".to_string());
  assert_eq!(template.render(Some("main"), Some(0), Some("abc")), "main.0.abc.js");

  let sidecar = FilenameTemplate::new("[file].map".to_string());
  assert_eq!(sidecar.render_sidecar("main.js"), "main.js.map");
}
