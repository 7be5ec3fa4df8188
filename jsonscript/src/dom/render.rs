///
/// Compile Unit Rendering
///
/// Prints a CompileUnit as C-style braced source text. The output is meant
/// for people: it is shown when compilation fails with visualize-on-error
/// enabled, and by the `show` command. Bodies are reproduced verbatim, one
/// indentation level deeper than their method signature.
///

use super::{CompileUnit, MethodDecl, NamespaceDecl, ParamDecl, TypeDecl, Visibility};

const INDENT: &str = "    ";

pub fn render(unit: &CompileUnit) -> String {
    let mut r = Renderer::default();
    for (i, ns) in unit.namespaces.iter().enumerate() {
        if i > 0 {
            r.blank_line();
        }
        r.namespace(ns);
    }
    r.out
}

#[derive(Default)]
struct Renderer {
    out: String,
    indent: usize,
}

impl Renderer {
    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
    }

    fn line(&mut self, text: &str) {
        self.write_indent();
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank_line(&mut self) {
        self.out.push('\n');
    }

    fn open(&mut self) {
        self.line("{");
        self.indent += 1;
    }

    fn close(&mut self) {
        self.indent -= 1;
        self.line("}");
    }

    fn namespace(&mut self, ns: &NamespaceDecl) {
        self.line(&format!("namespace {}", ns.name));
        self.open();
        for import in &ns.imports {
            self.line(&format!("using {};", import));
        }
        for (i, ty) in ns.types.iter().enumerate() {
            if i > 0 || !ns.imports.is_empty() {
                self.blank_line();
            }
            self.type_decl(ty);
        }
        self.close();
    }

    fn type_decl(&mut self, ty: &TypeDecl) {
        self.line(&format!("{}class {}", modifiers(ty.visibility, ty.is_static), ty.name));
        self.open();
        for (i, method) in ty.methods.iter().enumerate() {
            if i > 0 {
                self.blank_line();
            }
            self.method(method);
        }
        self.close();
    }

    fn method(&mut self, method: &MethodDecl) {
        let params: Vec<String> = method.params.iter().map(param).collect();
        self.line(&format!(
            "{}{} {}({})",
            modifiers(method.visibility, method.is_static),
            method.return_type,
            method.name,
            params.join(", ")
        ));
        self.open();
        for line in method.body.trim_end().lines() {
            let line = line.trim_end();
            if line.is_empty() {
                self.blank_line();
            } else {
                self.line(line);
            }
        }
        self.close();
    }
}

fn modifiers(visibility: Visibility, is_static: bool) -> String {
    let mut out = String::new();
    if let Some(keyword) = visibility.keyword() {
        out.push_str(keyword);
        out.push(' ');
    }
    if is_static {
        out.push_str("static ");
    }
    out
}

fn param(p: &ParamDecl) -> String {
    match &p.default {
        Some(default) => format!("{} {} = {}", p.ty, p.name, default),
        None => format!("{} {}", p.ty, p.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_unit() -> CompileUnit {
        CompileUnit {
            namespaces: vec![NamespaceDecl {
                name: "ExampleProject".to_string(),
                imports: vec!["System".to_string(), "System.Threading".to_string()],
                types: vec![TypeDecl {
                    name: "Program".to_string(),
                    visibility: Visibility::Public,
                    is_static: false,
                    methods: vec![
                        MethodDecl {
                            name: "Main".to_string(),
                            visibility: Visibility::Public,
                            is_static: false,
                            return_type: "System.Void".to_string(),
                            params: Vec::new(),
                            body: "ExampleMethod(\"1\");".to_string(),
                        },
                        MethodDecl {
                            name: "ExampleMethod".to_string(),
                            visibility: Visibility::Private,
                            is_static: true,
                            return_type: "System.Int32".to_string(),
                            params: vec![ParamDecl {
                                ty: "System.String".to_string(),
                                name: "exParam".to_string(),
                                default: Some("\"test\"".to_string()),
                            }],
                            body: "Console.WriteLine(exParam);\n\nreturn 3\n".to_string(),
                        },
                    ],
                }],
            }],
        }
    }

    #[test]
    fn test_render_example_unit() {
        insta::assert_snapshot!(render(&example_unit()), @r#"
        namespace ExampleProject
        {
            using System;
            using System.Threading;

            public class Program
            {
                public System.Void Main()
                {
                    ExampleMethod("1");
                }

                private static System.Int32 ExampleMethod(System.String exParam = "test")
                {
                    Console.WriteLine(exParam);

                    return 3
                }
            }
        }
        "#);
    }

    #[test]
    fn test_render_empty_containers() {
        let unit = CompileUnit {
            namespaces: vec![
                NamespaceDecl {
                    name: "Empty".to_string(),
                    imports: Vec::new(),
                    types: Vec::new(),
                },
                NamespaceDecl {
                    name: "Acme".to_string(),
                    imports: Vec::new(),
                    types: vec![TypeDecl {
                        name: "Bare".to_string(),
                        visibility: Visibility::Default,
                        is_static: true,
                        methods: Vec::new(),
                    }],
                },
            ],
        };

        insta::assert_snapshot!(render(&unit), @r"
        namespace Empty
        {
        }

        namespace Acme
        {
            static class Bare
            {
            }
        }
        ");
    }
}
