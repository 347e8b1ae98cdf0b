// Prompt text for daily trivia generation.
// The system message lives in llm_client::prompts.

/// Placeholder line used when there is no anti-repetition context yet.
pub const NO_PREVIOUS_QUESTIONS: &str = "  (ninguna todavía)";

/// Daily trivia prompt template.
/// Replace: {previous_questions}, {day_number}
pub const TRIVIA_PROMPT_TEMPLATE: &str = r#"Eres un experto en cultura general española. Tu trabajo es generar preguntas de trivia divertidas, variadas y educativas sobre España.

INSTRUCCIONES ESTRICTAS:
1. Genera exactamente 3 preguntas nuevas sobre cultura general española.
2. Las preguntas deben cubrir temas variados: historia, geografía, gastronomía, arte, música, deportes, ciencia, tradiciones, lengua, etc.
3. Cada pregunta puede ser:
   - Tipo test con 3 opciones (solo 1 correcta)
   - Tipo Verdadero/Falso (2 opciones: "Verdadero" y "Falso")
4. Las preguntas deben ser DIFERENTES a las siguientes preguntas ya existentes:
{previous_questions}
5. Genera también un "mensaje de burla" diario: una frase graciosa, ingeniosa y picante (con emojis) para mostrar al usuario que falla. Debe ser divertida pero no ofensiva. Estilo humor español.

FORMATO DE RESPUESTA (JSON estricto, sin bloques de código markdown):
{
  "preguntas": [
    {
      "pregunta": "texto de la pregunta",
      "opciones": ["opción 1", "opción 2", "opción 3"],
      "respuesta_correcta": 0
    },
    {
      "pregunta": "texto de la pregunta V/F",
      "opciones": ["Verdadero", "Falso"],
      "respuesta_correcta": 1
    },
    {
      "pregunta": "texto de la pregunta",
      "opciones": ["opción 1", "opción 2", "opción 3"],
      "respuesta_correcta": 2
    }
  ],
  "mensaje_burla": "¡Frase graciosa con emojis! 😂🥘"
}

IMPORTANTE:
- "respuesta_correcta" es el ÍNDICE (0, 1 o 2) de la opción correcta.
- Devuelve SOLO el JSON, sin texto extra ni bloques de código.
- Las preguntas deben ser factualmente correctas.
- Este es el día #{day_number} de CulturIA.
"#;
