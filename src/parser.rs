use std::iter::Peekable;
use std::vec::IntoIter;

use crate::command::{ArgumentVector, CommandSpec, PipelineSpec, RedirectKind};
use crate::errors::ParseError;
use crate::lexer::Token;
use crate::redirect::split_redirects;

struct Segmenter {
    tokens: Peekable<IntoIter<Token>>,
}

impl Segmenter {
    fn from(tokens: Vec<Token>) -> Self {
        Segmenter {
            tokens: tokens.into_iter().peekable(),
        }
    }

    /// Parse a pipeline: command ('|' command)*
    fn parse_pipeline(mut self) -> Result<Vec<Vec<Token>>, ParseError> {
        let mut commands = vec![self.parse_command()?];

        while self.tokens.next_if_eq(&Token::PipeOp).is_some() {
            commands.push(self.parse_command()?);
        }

        Ok(commands)
    }

    /// Collect tokens up to the next pipe or the end of the line.
    fn parse_command(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut command = Vec::new();
        while let Some(token) = self.tokens.next_if(|t| *t != Token::PipeOp) {
            command.push(token);
        }

        if command.is_empty() {
            return Err(ParseError::EmptyStage);
        }
        Ok(command)
    }
}

/// Split a line's tokens into per-stage token lists at each pipe.
///
/// The pipe tokens themselves are dropped. A stage with no tokens (adjacent
/// pipes, or a pipe at either end of the line) is an error.
pub fn segment(tokens: Vec<Token>) -> Result<Vec<Vec<Token>>, ParseError> {
    Segmenter::from(tokens).parse_pipeline()
}

/// Build the pipeline for one line.
///
/// Segments the tokens, strips redirections from every stage and checks that
/// `<` only appears on the first stage and `>` only on the last. Every
/// resulting argument vector is bounded by `max_args`, sentinel included.
pub fn construct_pipeline(tokens: Vec<Token>, max_args: usize) -> Result<PipelineSpec, ParseError> {
    let segments = segment(tokens)?;
    let last = segments.len() - 1;

    let mut stages = Vec::with_capacity(segments.len());
    for (index, segment) in segments.into_iter().enumerate() {
        let (words, redirects) = split_redirects(segment)?;

        for redirect in &redirects {
            match redirect.kind {
                RedirectKind::Input if index != 0 => return Err(ParseError::InputNotFirst),
                RedirectKind::Output if index != last => return Err(ParseError::OutputNotLast),
                _ => {}
            }
        }

        let argv = ArgumentVector::new(words, max_args)?;
        stages.push(CommandSpec { argv, redirects });
    }

    Ok(PipelineSpec { stages })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Redirect;
    use crate::lexer::split_into_tokens;

    fn parse(line: &str) -> Result<PipelineSpec, ParseError> {
        construct_pipeline(split_into_tokens(line), 100)
    }

    fn programs(spec: &PipelineSpec) -> Vec<&str> {
        spec.stages.iter().map(|s| s.argv.program()).collect()
    }

    #[test]
    fn test_single_command_is_one_stage() {
        let spec = parse("ls -l /tmp").unwrap();
        assert_eq!(spec.len(), 1);
        assert_eq!(spec.stages[0].argv.arguments(), &["-l".to_string(), "/tmp".to_string()]);
        assert!(spec.stages[0].redirects.is_empty());
    }

    #[test]
    fn test_pipes_split_stages_in_order() {
        let spec = parse("cat notes | sort | uniq -c").unwrap();
        assert_eq!(programs(&spec), vec!["cat", "sort", "uniq"]);
        assert_eq!(spec.stages[2].argv.arguments(), &["-c".to_string()]);
    }

    #[test]
    fn test_segment_keeps_words_between_boundaries() {
        let segments = segment(split_into_tokens("a b | c")).unwrap();
        assert_eq!(
            segments,
            vec![
                vec![Token::Word("a".into()), Token::Word("b".into())],
                vec![Token::Word("c".into())],
            ]
        );
    }

    #[test]
    fn test_empty_stages_are_rejected() {
        for line in ["| wc", "ls |", "ls | | wc", "|"] {
            assert_eq!(parse(line), Err(ParseError::EmptyStage), "line {:?}", line);
        }
    }

    #[test]
    fn test_stage_with_only_a_redirection_is_empty() {
        assert_eq!(parse("> out.txt"), Err(ParseError::EmptyStage));
    }

    #[test]
    fn test_redirections_at_endpoints_are_kept() {
        let spec = parse("sort < in.txt | uniq > out.txt").unwrap();
        assert_eq!(
            spec.stages[0].redirects,
            vec![Redirect { kind: RedirectKind::Input, target: "in.txt".into() }]
        );
        assert_eq!(
            spec.stages[1].redirects,
            vec![Redirect { kind: RedirectKind::Output, target: "out.txt".into() }]
        );
        assert_eq!(programs(&spec), vec!["sort", "uniq"]);
    }

    #[test]
    fn test_redirections_at_internal_positions_are_rejected() {
        assert_eq!(parse("echo hi > x | wc"), Err(ParseError::OutputNotLast));
        assert_eq!(parse("echo hi | wc < x"), Err(ParseError::InputNotFirst));
        assert_eq!(parse("a | b < x | c"), Err(ParseError::InputNotFirst));
    }

    #[test]
    fn test_argument_limit_counts_the_sentinel() {
        let tokens = split_into_tokens("echo a b c");
        assert!(construct_pipeline(tokens.clone(), 5).is_ok());
        assert_eq!(
            construct_pipeline(tokens, 4),
            Err(ParseError::TooManyArguments { count: 4, limit: 4 })
        );
    }
}
