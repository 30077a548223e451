//! Internationalization (i18n) support
//!
//! UI labels for the two built-in languages. The language comes from
//! `language` in `_config.yml`; anything not starting with `pt` falls back
//! to English.

use serde::Serialize;

/// Labels used by the page templates
#[derive(Debug, Clone, Serialize)]
pub struct Labels {
    pub loading: &'static str,
    pub load_more: &'static str,
    pub leave_preview: &'static str,
    pub edited_at: &'static str,
    pub prev_post: &'static str,
    pub next_post: &'static str,
    pub reading_time: &'static str,
    pub not_found_title: &'static str,
    pub not_found_message: &'static str,
    pub error_title: &'static str,
    pub error_message: &'static str,
    pub back_home: &'static str,
    pub no_posts: &'static str,
}

const PT_BR: Labels = Labels {
    loading: "Carregando...",
    load_more: "Carregar mais posts",
    leave_preview: "Sair do modo Preview",
    edited_at: "editado em",
    prev_post: "Post anterior",
    next_post: "Próximo post",
    reading_time: "min",
    not_found_title: "Post não encontrado",
    not_found_message: "O post que você procura não existe ou foi removido.",
    error_title: "Algo deu errado",
    error_message: "Não foi possível carregar o conteúdo. Tente novamente em instantes.",
    back_home: "Voltar para a home",
    no_posts: "Nenhum post publicado ainda.",
};

const EN: Labels = Labels {
    loading: "Loading...",
    load_more: "Load more posts",
    leave_preview: "Leave preview mode",
    edited_at: "edited on",
    prev_post: "Previous post",
    next_post: "Next post",
    reading_time: "min",
    not_found_title: "Post not found",
    not_found_message: "The post you are looking for does not exist or was removed.",
    error_title: "Something went wrong",
    error_message: "The content could not be loaded. Please try again shortly.",
    back_home: "Back to home",
    no_posts: "No posts published yet.",
};

impl Labels {
    /// Labels for a language tag such as `pt-BR` or `en`
    pub fn for_language(language: &str) -> &'static Labels {
        if language.to_ascii_lowercase().starts_with("pt") {
            &PT_BR
        } else {
            &EN
        }
    }
}
