//! Parser for the netlist language.

use std::collections::{HashMap, HashSet};

use super::ast::*;
use super::lexer::{parse_value, Lexer, Token, TokenKind};
use crate::error::{DesignError, Result};

/// Parser for netlist text.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Create a new parser, reading the first token eagerly.
    pub fn new(mut lexer: Lexer<'a>) -> Result<Self> {
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// Parse the entire netlist.
    pub fn parse(&mut self) -> Result<CircuitAst> {
        let mut ast = CircuitAst::new();
        let mut seen = HashSet::new();

        while self.current.kind != TokenKind::Eof {
            match self.current.kind {
                TokenKind::Newline => {
                    self.advance()?;
                    continue;
                }
                TokenKind::Directive => self.parse_directive(&mut ast)?,
                TokenKind::Identifier => {
                    let component = self.parse_component()?;
                    if !seen.insert(component.name.to_ascii_uppercase()) {
                        return Err(DesignError::DuplicateComponent {
                            name: component.name,
                        });
                    }
                    ast.push(component);
                }
                _ => {
                    return Err(DesignError::parse(
                        self.current.line,
                        format!("unexpected token: {:?}", self.current.text),
                    ));
                }
            }

            if self.current.kind == TokenKind::Newline {
                self.advance()?;
            }
        }

        Ok(ast)
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.current.kind == kind {
            let tok = self.current.clone();
            self.advance()?;
            Ok(tok)
        } else {
            Err(DesignError::parse(
                self.current.line,
                format!("expected {:?}, got {:?}", kind, self.current.kind),
            ))
        }
    }

    /// Consume a numeric token and convert it, suffix included.
    fn expect_value(&mut self, line: usize) -> Result<f64> {
        let text = self.expect(TokenKind::Number)?.text;
        parse_value(&text).ok_or_else(|| DesignError::parse(line, format!("invalid number: {}", text)))
    }

    fn parse_directive(&mut self, ast: &mut CircuitAst) -> Result<()> {
        let directive = self.current.text.clone();
        let line = self.current.line;
        self.advance()?;

        match directive.to_lowercase().as_str() {
            ".input" => ast.input_node = Some(self.node_name()?),
            ".output" => ast.output_node = Some(self.node_name()?),
            ".node" => {
                let node = self.node_name()?;
                if node != "0" && !ast.nodes.contains(&node) {
                    ast.nodes.push(node);
                }
            }
            _ => {
                return Err(DesignError::parse(
                    line,
                    format!("unknown directive: {}", directive),
                ));
            }
        }

        Ok(())
    }

    /// A node reference: an identifier, or a bare number such as `0`.
    fn node_name(&mut self) -> Result<String> {
        match self.current.kind {
            TokenKind::Identifier | TokenKind::Number => {
                let text = normalize_node(&self.current.text);
                self.advance()?;
                Ok(text)
            }
            _ => Err(DesignError::parse(
                self.current.line,
                format!("expected node name, got {:?}", self.current.kind),
            )),
        }
    }

    fn parse_component(&mut self) -> Result<ComponentDef> {
        let name = self.current.text.clone();
        let line = self.current.line;
        self.advance()?;

        let first_char = name.chars().next().unwrap_or('?');
        let component_type =
            ComponentType::from_prefix(first_char).ok_or_else(|| DesignError::UnknownComponentType {
                component_type: name.clone(),
                line,
            })?;

        let mut nodes = Vec::with_capacity(ComponentType::TERMINALS);
        let mut value = None;
        let mut params = HashMap::new();

        while self.current.kind != TokenKind::Newline && self.current.kind != TokenKind::Eof {
            if nodes.len() < ComponentType::TERMINALS {
                nodes.push(self.node_name()?);
                continue;
            }

            match self.current.kind {
                TokenKind::Number => {
                    let v = self.expect_value(line)?;
                    if value.replace(v).is_some() {
                        return Err(DesignError::invalid_component(&name, line, "more than one value"));
                    }
                }
                TokenKind::Identifier => {
                    let word = self.current.text.clone();
                    self.advance()?;
                    match word.to_ascii_uppercase().as_str() {
                        "DC" if component_type.is_source() => value = Some(self.expect_value(line)?),
                        "AC" if component_type.is_source() => {
                            params.insert("ac".to_string(), self.expect_value(line)?);
                        }
                        _ => {
                            self.expect(TokenKind::Equals)?;
                            params.insert(word.to_lowercase(), self.expect_value(line)?);
                        }
                    }
                }
                _ => {
                    return Err(DesignError::parse(
                        line,
                        format!("unexpected token: {:?}", self.current.text),
                    ));
                }
            }
        }

        if nodes.len() < ComponentType::TERMINALS {
            return Err(DesignError::invalid_component(
                &name,
                line,
                format!("expected {} nodes, got {}", ComponentType::TERMINALS, nodes.len()),
            ));
        }

        if !component_type.is_source() && value.is_none() {
            return Err(DesignError::invalid_component(&name, line, "passive element requires a value"));
        }

        Ok(ComponentDef {
            component_type,
            name,
            nodes,
            value,
            params,
            line,
        })
    }
}

/// Map the ground aliases onto `0`.
fn normalize_node(name: &str) -> String {
    if name.eq_ignore_ascii_case("GND") {
        "0".to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use super::*;

    #[test]
    fn test_parse_resistor() {
        let ast = parse("R1 in out 10k").unwrap();
        assert_eq!(ast.components.len(), 1);
        assert_eq!(ast.components[0].component_type, ComponentType::Resistor);
        assert_eq!(ast.components[0].name, "R1");
        assert_eq!(ast.components[0].nodes, vec!["in", "out"]);
        assert_eq!(ast.components[0].value, Some(10_000.0));
    }

    #[test]
    fn test_parse_input_output() {
        let ast = parse(".input in\n.output out\nR1 in out 1k").unwrap();
        assert_eq!(ast.input_node, Some("in".to_string()));
        assert_eq!(ast.output_node, Some("out".to_string()));
    }

    #[test]
    fn test_parse_ac_source() {
        let ast = parse("VIN in GND DC 0 AC 1").unwrap();
        let source = &ast.components[0];
        assert_eq!(source.component_type, ComponentType::VoltageSource);
        assert_eq!(source.nodes, vec!["in", "0"]);
        assert_eq!(source.value, Some(0.0));
        assert_eq!(source.ac_magnitude(), Some(1.0));
    }

    #[test]
    fn test_parse_with_comments() {
        let input = "# This is a comment\nR1 in out 1k ; inline comment style\n";
        let ast = parse(input).unwrap();
        assert_eq!(ast.components.len(), 1);
    }

    #[test]
    fn test_unknown_prefix() {
        assert!(matches!(
            parse("Q1 c b e"),
            Err(DesignError::UnknownComponentType { line: 1, .. })
        ));
    }

    #[test]
    fn test_passive_without_value() {
        assert!(matches!(
            parse("C1 out 0"),
            Err(DesignError::InvalidComponent { .. })
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        assert!(matches!(
            parse("R1 a b 1k\nr1 b 0 2k"),
            Err(DesignError::DuplicateComponent { .. })
        ));
    }

    #[test]
    fn test_rendered_ast_reparses() {
        let mut ast = CircuitAst::new().with_ports("in", "out");
        ast.push(ComponentDef::ac_source("VIN", "in", "0", 1.0));
        ast.push(ComponentDef::passive(ComponentType::Resistor, "R1", "in", "n1", 4.7e3));
        ast.push(ComponentDef::passive(ComponentType::Inductor, "L1", "n1", "out", 2.2e-4));
        ast.push(ComponentDef::passive(ComponentType::Capacitor, "C1", "out", "0", 3.3e-8));

        let reparsed = parse(&ast.to_string()).unwrap();
        assert_eq!(reparsed.input_node, ast.input_node);
        assert_eq!(reparsed.output_node, ast.output_node);
        assert_eq!(reparsed.components.len(), 4);
        for (a, b) in ast.components.iter().zip(&reparsed.components) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.component_type, b.component_type);
            assert_eq!(a.nodes, b.nodes);
            assert_eq!(a.value, b.value);
            assert_eq!(a.ac_magnitude(), b.ac_magnitude());
        }
    }
}
